use std::collections::BTreeMap;
use std::path::PathBuf;

use sheetbind_engine::engine::{DependencyGraph, is_identifier};

use super::formula::Formula;
use super::node::{NodeKey, NodeRef};
use super::object::{Feature, Object};
use super::sheet::Sheet;
use crate::error::{CoreError, Result};

/// Cross-document link table: `(document qualifier, object qualifier)` as written in an
/// expression, mapped to the durable `(document name, object name)` it resolved to.
pub type LinkTable = BTreeMap<(String, String), (String, String)>;

/// A document: an ordered set of objects sharing one namespace, plus its dependency graph.
#[derive(Clone, Debug)]
pub struct Document {
    name: String,
    label: String,
    objects: Vec<Object>,
    /// Forward edges of this document's nodes and reverse registrations on its targets,
    /// including those made by other documents.
    pub(crate) graph: DependencyGraph<NodeRef>,
    pub(crate) links: LinkTable,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the document has been modified since it was loaded or saved
    pub modified: bool,
}

impl Document {
    /// Create an empty document. Side-effect free: it does not touch the filesystem.
    pub fn new(name: &str) -> Self {
        Document {
            name: name.to_string(),
            label: name.to_string(),
            objects: Vec::new(),
            graph: DependencyGraph::new(),
            links: LinkTable::new(),
            file_path: None,
            modified: false,
        }
    }

    /// Durable name (the file stem for saved documents).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Find an object by name, then by label.
    pub fn object_index(&self, qualifier: &str) -> Option<usize> {
        self.objects
            .iter()
            .position(|o| o.name() == qualifier)
            .or_else(|| self.objects.iter().position(|o| o.label() == qualifier))
    }

    pub fn object(&self, qualifier: &str) -> Option<&Object> {
        self.object_index(qualifier).map(|i| &self.objects[i])
    }

    pub(crate) fn object_at(&self, index: usize) -> &Object {
        &self.objects[index]
    }

    pub(crate) fn object_at_mut(&mut self, index: usize) -> &mut Object {
        &mut self.objects[index]
    }

    pub(crate) fn object_by_name_mut(&mut self, name: &str) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.name() == name)
    }

    /// Object lookup for API calls, with a descriptive error.
    pub fn require_object(&self, qualifier: &str) -> Result<usize> {
        self.object_index(qualifier)
            .ok_or_else(|| CoreError::NoSuchObject {
                document: self.name.clone(),
                object: qualifier.to_string(),
            })
    }

    pub fn sheet(&self, qualifier: &str) -> Result<&Sheet> {
        let index = self.require_object(qualifier)?;
        self.objects[index]
            .as_sheet()
            .ok_or_else(|| CoreError::NotASheet(qualifier.to_string()))
    }

    pub fn feature(&self, qualifier: &str) -> Result<&Feature> {
        let index = self.require_object(qualifier)?;
        self.objects[index]
            .as_feature()
            .ok_or_else(|| CoreError::NotAFeature(qualifier.to_string()))
    }

    /// True if `text` is already used as the name or label of an object other than `except`.
    pub(crate) fn name_in_use(&self, text: &str, except: Option<usize>) -> bool {
        self.objects
            .iter()
            .enumerate()
            .any(|(i, o)| Some(i) != except && (o.name() == text || o.label() == text))
    }

    /// Add an object. Names must be identifiers, unique among names and labels.
    pub fn add_object(&mut self, object: Object) -> Result<()> {
        if !is_identifier(object.name()) {
            return Err(CoreError::InvalidLabel(object.name().to_string()));
        }
        if self.name_in_use(object.name(), None) || self.name_in_use(object.label(), None) {
            return Err(CoreError::DuplicateObject {
                document: self.name.clone(),
                object: object.name().to_string(),
            });
        }
        self.objects.push(object);
        self.modified = true;
        Ok(())
    }

    /// Every expression-bound node of the document, qualified by document name.
    pub fn formulas(&self) -> Vec<(NodeRef, &Formula)> {
        self.objects
            .iter()
            .flat_map(|o| o.formulas())
            .map(|(key, f)| {
                (
                    NodeRef {
                        document: self.name.clone(),
                        key,
                    },
                    f,
                )
            })
            .collect()
    }

    pub fn formula(&self, key: &NodeKey) -> Option<&Formula> {
        self.objects
            .iter()
            .find(|o| o.name() == key.object())?
            .formula(key)
    }

    pub(crate) fn formula_mut(&mut self, key: &NodeKey) -> Option<&mut Formula> {
        self.object_by_name_mut(key.object())?.formula_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_lookup_prefers_names() {
        let mut doc = Document::new("doc");
        doc.add_object(Object::Sheet(Sheet::new("Spreadsheet"))).unwrap();
        doc.add_object(Object::Sheet(Sheet::new("Other"))).unwrap();
        doc.object_at_mut(1).set_label("Params");
        assert_eq!(doc.object("Params").unwrap().name(), "Other");
        assert_eq!(doc.object("Other").unwrap().name(), "Other");
        assert!(doc.object("Missing").is_none());
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let mut doc = Document::new("doc");
        doc.add_object(Object::Sheet(Sheet::new("Spreadsheet"))).unwrap();
        assert!(matches!(
            doc.add_object(Object::Feature(Feature::new("Spreadsheet", "Part::Box"))),
            Err(CoreError::DuplicateObject { .. })
        ));
        assert!(matches!(
            doc.add_object(Object::Sheet(Sheet::new("two words"))),
            Err(CoreError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_kind_checks() {
        let mut doc = Document::new("doc");
        doc.add_object(Object::Feature(Feature::new("Box", "Part::Box"))).unwrap();
        assert!(matches!(doc.sheet("Box"), Err(CoreError::NotASheet(_))));
        assert!(doc.feature("Box").is_ok());
    }
}
