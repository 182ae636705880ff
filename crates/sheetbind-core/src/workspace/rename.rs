//! Alias and label renames, propagated into the text of every binding that uses them.

use sheetbind_engine::engine::{Expression, RefTarget, Reference, Rewrite};
use tracing::debug;

use super::Workspace;
use super::resolve::ObjectTarget;
use crate::document::{NodeRef, validate_label};
use crate::error::{CoreError, Result};

impl Workspace {
    /// Rewrite every binding in every open document with `f`, given each reference and
    /// where its qualifiers lead. Unresolved references are passed over.
    fn plan_rewrites(
        &self,
        mut f: impl FnMut(&Reference, ObjectTarget) -> Rewrite,
    ) -> Result<Vec<(NodeRef, Expression)>> {
        let mut rewrites = Vec::new();
        for node in self.formula_nodes() {
            let Some(formula) = self.formula(&node) else {
                continue;
            };
            let rewritten = formula.expression().rewrite(|reference| {
                match self.resolve_object(&node.document, node.object(), reference) {
                    Ok(target) => f(reference, target),
                    Err(_) => Rewrite::Keep,
                }
            })?;
            if let Some(expression) = rewritten {
                rewrites.push((node, expression));
            }
        }
        Ok(rewrites)
    }

    /// Store planned rewrites, returning the nodes that changed.
    fn apply_rewrites(&mut self, rewrites: Vec<(NodeRef, Expression)>) -> Vec<NodeRef> {
        let mut touched = Vec::with_capacity(rewrites.len());
        for (node, expression) in rewrites {
            debug!(node = %node, text = %expression, "rewrote binding");
            if let Some(formula) = self.formula_mut(&node) {
                formula.set_expression(expression);
            }
            if let Some(document) = self.doc_by_name_mut(&node.document) {
                document.modified = true;
            }
            touched.push(node);
        }
        touched
    }

    /// Set, rename or (with an empty `name`) clear the alias of a cell.
    ///
    /// Renaming rewrites every reference that used the old alias. Returns the previous
    /// alias of the cell.
    pub fn set_alias(
        &mut self,
        document: &str,
        sheet: &str,
        address: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let (doc, object) = self.sheet_index(document, sheet)?;
        let current = self.sheet_at(doc, object)?;
        let address = current.lookup(address)?;

        // Validate against a copy so a rejected alias changes nothing.
        let mut table = current.aliases().clone();
        let previous = table.set_alias(address, name)?;

        let rewrites = match &previous {
            Some(old) if !name.is_empty() && old != name => {
                self.plan_rewrites(|reference, target| match &reference.target {
                    RefTarget::Name(used)
                        if target.doc == doc && target.object == object && used == old =>
                    {
                        Rewrite::Replace(Reference {
                            target: RefTarget::Name(name.to_string()),
                            ..reference.clone()
                        })
                    }
                    _ => Rewrite::Keep,
                })?
            }
            _ => Vec::new(),
        };

        self.sheet_at_mut(doc, object)?.set_alias(address, name)?;
        self.documents[doc].modified = true;
        debug!(document, sheet, %address, alias = name, previous = ?previous, "set alias");
        let mut touched = self.apply_rewrites(rewrites);
        touched.push(NodeRef::cell(
            self.documents[doc].name(),
            self.documents[doc].object_at(object).name(),
            address,
        ));
        self.after_edit(touched);
        Ok(previous)
    }

    /// Relabel a sheet or feature. References that rendered the old label follow it.
    pub fn set_label(&mut self, document: &str, object: &str, label: &str) -> Result<()> {
        validate_label(label)?;
        let doc = self.doc_index(document)?;
        let index = self.documents[doc].require_object(object)?;
        if self.documents[doc].name_in_use(label, Some(index)) {
            return Err(CoreError::DuplicateLabel(label.to_string()));
        }
        let old = self.documents[doc].object_at(index).label().to_string();
        if old == label {
            return Ok(());
        }

        let rewrites = self.plan_rewrites(|reference, target| {
            if target.doc == doc
                && target.object == index
                && reference.object.as_deref() == Some(old.as_str())
            {
                Rewrite::Replace(Reference {
                    object: Some(label.to_string()),
                    ..reference.clone()
                })
            } else {
                Rewrite::Keep
            }
        })?;

        self.documents[doc].object_at_mut(index).set_label(label);
        self.documents[doc].modified = true;
        debug!(document, object, from = %old, to = label, "relabel object");
        let touched = self.apply_rewrites(rewrites);
        self.after_edit(touched);
        Ok(())
    }

    /// Relabel a document. References whose document qualifier rendered the old label
    /// follow it; name-qualified references are untouched.
    pub fn set_document_label(&mut self, document: &str, label: &str) -> Result<()> {
        validate_label(label)?;
        let doc = self.doc_index(document)?;
        let taken = self
            .documents
            .iter()
            .enumerate()
            .any(|(i, d)| i != doc && (d.name() == label || d.label() == label));
        if taken {
            return Err(CoreError::DuplicateLabel(label.to_string()));
        }
        let old = self.documents[doc].label().to_string();
        if old == label {
            return Ok(());
        }
        let name = self.documents[doc].name().to_string();

        let rewrites = self.plan_rewrites(|reference, target| {
            let written = reference.document.as_deref();
            if target.doc == doc
                && written == Some(old.as_str())
                && written != Some(name.as_str())
            {
                Rewrite::Replace(Reference {
                    document: Some(label.to_string()),
                    ..reference.clone()
                })
            } else {
                Rewrite::Keep
            }
        })?;

        self.documents[doc].set_label(label);
        self.documents[doc].modified = true;
        debug!(document, from = %old, to = label, "relabel document");
        let touched = self.apply_rewrites(rewrites);
        self.after_edit(touched);
        Ok(())
    }

    /// Rewrite qualifiers that only resolve through a link table to the current label of
    /// what they lead to. Run when a document is opened.
    pub(crate) fn sync_links(&mut self) -> Result<Vec<NodeRef>> {
        let rewrites = self.plan_rewrites(|reference, target| {
            if !target.doc_via_link && !target.object_via_link {
                return Rewrite::Keep;
            }
            let document = &self.documents[target.doc];
            let mut synced = reference.clone();
            if target.doc_via_link {
                synced.document = Some(document.label().to_string());
            }
            if target.object_via_link {
                synced.object = Some(document.object_at(target.object).label().to_string());
            }
            Rewrite::Replace(synced)
        })?;
        Ok(self.apply_rewrites(rewrites))
    }
}
