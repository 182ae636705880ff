//! Sheet and feature operations.

use sheetbind_engine::engine::{CellAddress, Expression, Value, is_identifier};
use tracing::warn;

use super::{EditOutcome, Workspace};
use crate::document::{BindingStatus, Cell, Feature, Formula, NodeRef, Object, Sheet};
use crate::error::{CoreError, Result};

impl Workspace {
    /// `(document, object)` indices of a sheet.
    pub(crate) fn sheet_index(&self, document: &str, sheet: &str) -> Result<(usize, usize)> {
        let doc = self.doc_index(document)?;
        let object = self.documents[doc].require_object(sheet)?;
        match self.documents[doc].object_at(object) {
            Object::Sheet(_) => Ok((doc, object)),
            Object::Feature(_) => Err(CoreError::NotASheet(sheet.to_string())),
        }
    }

    /// `(document, object)` indices of a feature.
    pub(crate) fn feature_index(&self, document: &str, feature: &str) -> Result<(usize, usize)> {
        let doc = self.doc_index(document)?;
        let object = self.documents[doc].require_object(feature)?;
        match self.documents[doc].object_at(object) {
            Object::Feature(_) => Ok((doc, object)),
            Object::Sheet(_) => Err(CoreError::NotAFeature(feature.to_string())),
        }
    }

    pub(crate) fn sheet_at(&self, doc: usize, object: usize) -> Result<&Sheet> {
        let object = self.documents[doc].object_at(object);
        object
            .as_sheet()
            .ok_or_else(|| CoreError::NotASheet(object.name().to_string()))
    }

    pub(crate) fn sheet_at_mut(&mut self, doc: usize, object: usize) -> Result<&mut Sheet> {
        let object = self.documents[doc].object_at_mut(object);
        let name = object.name().to_string();
        object.as_sheet_mut().ok_or(CoreError::NotASheet(name))
    }

    fn feature_at(&self, doc: usize, object: usize) -> Result<&Feature> {
        let object = self.documents[doc].object_at(object);
        object
            .as_feature()
            .ok_or_else(|| CoreError::NotAFeature(object.name().to_string()))
    }

    fn feature_at_mut(&mut self, doc: usize, object: usize) -> Result<&mut Feature> {
        let object = self.documents[doc].object_at_mut(object);
        let name = object.name().to_string();
        object.as_feature_mut().ok_or(CoreError::NotAFeature(name))
    }

    /// Node of the cell named by `address` (an address or an alias of the sheet).
    fn cell_node(
        &self,
        document: &str,
        sheet: &str,
        address: &str,
    ) -> Result<(NodeRef, CellAddress)> {
        let (doc, object) = self.sheet_index(document, sheet)?;
        let sheet = self.sheet_at(doc, object)?;
        let address = sheet.lookup(address)?;
        let node = NodeRef::cell(self.documents[doc].name(), sheet.name(), address);
        Ok((node, address))
    }

    fn property_node(&self, document: &str, object: &str, property: &str) -> Result<NodeRef> {
        let (doc, index) = self.feature_index(document, object)?;
        let feature = self.feature_at(doc, index)?;
        if feature.property(property).is_none() {
            return Err(CoreError::NoSuchProperty {
                object: feature.name().to_string(),
                property: property.to_string(),
            });
        }
        Ok(NodeRef::property(
            self.documents[doc].name(),
            feature.name(),
            property,
        ))
    }

    /// Report the cycle closed by an edit of `node`, if any.
    fn edit_outcome(&self, node: &NodeRef) -> EditOutcome {
        let cycle = self.find_cycle(node);
        if let Some(path) = &cycle {
            let path: Vec<String> = path.iter().map(|n| n.to_string()).collect();
            warn!(node = %node, cycle = %path.join(" -> "), "edit closes a dependency cycle");
        }
        EditOutcome { cycle }
    }

    /// Add an empty sheet to a document.
    pub fn add_sheet(&mut self, document: &str, name: &str) -> Result<()> {
        let doc = self.doc_index(document)?;
        self.documents[doc].add_object(Object::Sheet(Sheet::new(name)))?;
        // A new object may satisfy a qualifier that did not resolve before.
        self.after_edit(Vec::new());
        Ok(())
    }

    /// Add a feature with no properties to a document.
    pub fn add_feature(&mut self, document: &str, name: &str, type_name: &str) -> Result<()> {
        let doc = self.doc_index(document)?;
        self.documents[doc].add_object(Object::Feature(Feature::new(name, type_name)))?;
        self.after_edit(Vec::new());
        Ok(())
    }

    /// Set a cell from user input: empty clears it, a leading `=` makes it a formula,
    /// anything else is a literal.
    ///
    /// A parse error leaves the previous content and value untouched.
    pub fn set_cell(
        &mut self,
        document: &str,
        sheet: &str,
        address: &str,
        input: &str,
    ) -> Result<EditOutcome> {
        let (doc, object) = self.sheet_index(document, sheet)?;
        let (node, address) = self.cell_node(document, sheet, address)?;
        let last_value = self
            .sheet_at(doc, object)?
            .cell(address)
            .map(Cell::value)
            .unwrap_or_default();
        let cell = Cell::from_input(input, last_value)?;
        let is_formula = cell.formula().is_some();

        self.sheet_at_mut(doc, object)?.put_cell(address, cell);
        self.documents[doc].modified = true;
        self.after_content_edit(vec![node.clone()]);

        if is_formula {
            Ok(self.edit_outcome(&node))
        } else {
            Ok(EditOutcome::default())
        }
    }

    /// Text the cell was entered as (`=` followed by the source for formulas).
    pub fn cell_contents(&self, document: &str, sheet: &str, address: &str) -> Result<String> {
        let (doc, object) = self.sheet_index(document, sheet)?;
        let sheet = self.sheet_at(doc, object)?;
        let address = sheet.lookup(address)?;
        Ok(sheet
            .cell(address)
            .map(Cell::to_input_string)
            .unwrap_or_default())
    }

    /// Current value of a cell, recomputing it first if it is stale.
    pub fn cell_value(&mut self, document: &str, sheet: &str, address: &str) -> Result<Value> {
        let (node, _) = self.cell_node(document, sheet, address)?;
        self.refresh(&node);
        Ok(self.read_node(&node)?)
    }

    pub fn cell_status(&self, document: &str, sheet: &str, address: &str) -> Result<BindingStatus> {
        let (node, _) = self.cell_node(document, sheet, address)?;
        Ok(self
            .formula(&node)
            .map(Formula::status)
            .unwrap_or(BindingStatus::UpToDate))
    }

    pub fn alias_of(&self, document: &str, sheet: &str, address: &str) -> Result<Option<String>> {
        let (doc, object) = self.sheet_index(document, sheet)?;
        let address = CellAddress::parse(address)?;
        Ok(self
            .sheet_at(doc, object)?
            .aliases()
            .name_of(address)
            .map(str::to_string))
    }

    pub fn resolve_alias(&self, document: &str, sheet: &str, name: &str) -> Result<CellAddress> {
        let (doc, object) = self.sheet_index(document, sheet)?;
        Ok(self.sheet_at(doc, object)?.aliases().resolve(name)?)
    }

    /// Set a literal property value, creating the property if needed. Property names are
    /// identifiers.
    pub fn set_property(
        &mut self,
        document: &str,
        object: &str,
        property: &str,
        value: Value,
    ) -> Result<()> {
        if !is_identifier(property) {
            return Err(CoreError::InvalidProperty(property.to_string()));
        }
        let (doc, index) = self.feature_index(document, object)?;
        let feature = self.feature_at_mut(doc, index)?;
        let created = feature.property(property).is_none();
        feature.property_entry(property).set_value(value);
        let node = NodeRef::property(
            self.documents[doc].name(),
            self.documents[doc].object_at(index).name(),
            property,
        );
        self.documents[doc].modified = true;
        if created {
            // Bindings naming the new property resolve now.
            self.after_edit(vec![node]);
        } else {
            self.after_content_edit(vec![node]);
        }
        Ok(())
    }

    /// Bind an expression to an existing property. The parse happens before anything
    /// changes.
    pub fn bind_expression(
        &mut self,
        document: &str,
        object: &str,
        property: &str,
        text: &str,
    ) -> Result<EditOutcome> {
        let node = self.property_node(document, object, property)?;
        let expression = Expression::parse(text)?;
        let (doc, index) = self.feature_index(document, object)?;
        let slot = self
            .feature_at_mut(doc, index)?
            .property_entry(property);
        let last_value = slot.value();
        slot.bind(Formula::new(expression, last_value));
        self.documents[doc].modified = true;
        self.after_content_edit(vec![node.clone()]);
        Ok(self.edit_outcome(&node))
    }

    /// Remove a property's binding. The property keeps its last value.
    pub fn clear_expression(&mut self, document: &str, object: &str, property: &str) -> Result<()> {
        let node = self.property_node(document, object, property)?;
        let (doc, index) = self.feature_index(document, object)?;
        if self
            .feature_at_mut(doc, index)?
            .property_entry(property)
            .unbind()
            .is_some()
        {
            self.documents[doc].modified = true;
            self.after_content_edit(vec![node]);
        }
        Ok(())
    }

    /// Value of a property, recomputing its binding first if it is stale.
    pub fn current_value(&mut self, document: &str, object: &str, property: &str) -> Result<Value> {
        let node = self.property_node(document, object, property)?;
        self.refresh(&node);
        Ok(self.read_node(&node)?)
    }

    pub fn status(&self, document: &str, object: &str, property: &str) -> Result<BindingStatus> {
        let node = self.property_node(document, object, property)?;
        Ok(self
            .formula(&node)
            .map(Formula::status)
            .unwrap_or(BindingStatus::UpToDate))
    }

    /// Source text of a property's binding, without the leading `=`.
    pub fn expression_text(
        &self,
        document: &str,
        object: &str,
        property: &str,
    ) -> Result<Option<String>> {
        let node = self.property_node(document, object, property)?;
        Ok(self.formula(&node).map(|f| f.source().to_string()))
    }

    /// Combined status of every binding of an object.
    pub fn object_status(&self, document: &str, object: &str) -> Result<BindingStatus> {
        let doc = self.doc_index(document)?;
        let index = self.documents[doc].require_object(object)?;
        Ok(self.documents[doc].object_at(index).status())
    }
}
