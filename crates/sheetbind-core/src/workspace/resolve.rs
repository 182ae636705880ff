//! Reference resolution against the open documents.
//!
//! Qualifiers are matched by name first, then by label. A document or object that cannot be
//! found that way is looked up in the referencing document's link table, which remembers
//! what each qualifier resolved to when the reference was last valid.

use sheetbind_engine::engine::{CellRange, EngineError, EngineResult, RefTarget, Reference};

use super::Workspace;
use crate::document::{NodeRef, Object};

/// The object a reference's qualifiers lead to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ObjectTarget {
    pub doc: usize,
    pub object: usize,
    /// The document qualifier only matched through the link table.
    pub doc_via_link: bool,
    /// The object qualifier only matched through the link table.
    pub object_via_link: bool,
}

/// What a reference resolves to.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Resolved {
    Cell(NodeRef),
    Property(NodeRef),
    Range {
        document: String,
        object: String,
        range: CellRange,
    },
}

impl Workspace {
    /// Open document whose name, or else label, is `qualifier`.
    pub(crate) fn find_document(&self, qualifier: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|d| d.name() == qualifier)
            .or_else(|| self.documents.iter().position(|d| d.label() == qualifier))
    }

    /// Resolve the qualifiers of `reference`, written in `scope_object` of `scope_doc`.
    pub(crate) fn resolve_object(
        &self,
        scope_doc: &str,
        scope_object: &str,
        reference: &Reference,
    ) -> EngineResult<ObjectTarget> {
        let unresolved = || EngineError::UnresolvedReference(reference.to_string());
        let from = self
            .documents
            .iter()
            .position(|d| d.name() == scope_doc)
            .ok_or_else(unresolved)?;
        let links = &self.documents[from].links;
        let linked = |docq: &str, objq: &str| links.get(&(docq.to_string(), objq.to_string()));

        let (doc, doc_via_link) = match &reference.document {
            None => (from, false),
            Some(docq) => match self.find_document(docq) {
                Some(index) => (index, false),
                None => {
                    let objq = reference.object.as_deref().unwrap_or_default();
                    let (docname, _) = linked(docq, objq).ok_or_else(unresolved)?;
                    let index = self
                        .documents
                        .iter()
                        .position(|d| d.name() == docname)
                        .ok_or_else(unresolved)?;
                    (index, true)
                }
            },
        };

        let document = &self.documents[doc];
        let (object, object_via_link) = match &reference.object {
            None => {
                let index = document
                    .objects()
                    .iter()
                    .position(|o| o.name() == scope_object)
                    .ok_or_else(unresolved)?;
                (index, false)
            }
            Some(objq) => match document.object_index(objq) {
                Some(index) => (index, false),
                None => {
                    let docq = reference.document.as_deref().ok_or_else(unresolved)?;
                    let (docname, objname) = linked(docq, objq).ok_or_else(unresolved)?;
                    if docname != document.name() {
                        return Err(unresolved());
                    }
                    let index = document
                        .objects()
                        .iter()
                        .position(|o| o.name() == objname)
                        .ok_or_else(unresolved)?;
                    (index, true)
                }
            },
        };

        Ok(ObjectTarget {
            doc,
            object,
            doc_via_link,
            object_via_link,
        })
    }

    /// Resolve `reference` down to a node or a range of one sheet.
    pub(crate) fn resolve(
        &self,
        scope_doc: &str,
        scope_object: &str,
        reference: &Reference,
    ) -> EngineResult<Resolved> {
        let target = self.resolve_object(scope_doc, scope_object, reference)?;
        let document = &self.documents[target.doc];
        match (document.object_at(target.object), &reference.target) {
            (Object::Sheet(sheet), RefTarget::Cell(address)) => Ok(Resolved::Cell(NodeRef::cell(
                document.name(),
                sheet.name(),
                *address,
            ))),
            (Object::Sheet(sheet), RefTarget::Range(range)) => Ok(Resolved::Range {
                document: document.name().to_string(),
                object: sheet.name().to_string(),
                range: *range,
            }),
            (Object::Sheet(sheet), RefTarget::Name(name)) => {
                let address = sheet.aliases().resolve(name)?;
                Ok(Resolved::Cell(NodeRef::cell(
                    document.name(),
                    sheet.name(),
                    address,
                )))
            }
            (Object::Feature(feature), RefTarget::Name(name))
                if feature.property(name).is_some() =>
            {
                Ok(Resolved::Property(NodeRef::property(
                    document.name(),
                    feature.name(),
                    name,
                )))
            }
            (Object::Feature(_), _) => {
                Err(EngineError::UnresolvedReference(reference.to_string()))
            }
        }
    }
}
