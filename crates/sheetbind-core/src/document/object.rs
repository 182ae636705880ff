//! Bindable document objects: sheets and features.

use std::collections::BTreeMap;

use sheetbind_engine::engine::{EngineError, Value};

use super::formula::{BindingStatus, Formula};
use super::node::NodeKey;
use super::sheet::Sheet;

/// A named property of a feature: a literal value, optionally driven by an expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Property {
    value: Value,
    binding: Option<Formula>,
}

impl Property {
    pub fn new(value: Value) -> Self {
        Property {
            value,
            binding: None,
        }
    }

    /// Current value: the binding's cached value when bound.
    pub fn value(&self) -> Value {
        match &self.binding {
            Some(formula) => formula.value().clone(),
            None => self.value.clone(),
        }
    }

    pub fn binding(&self) -> Option<&Formula> {
        self.binding.as_ref()
    }

    pub(crate) fn binding_mut(&mut self) -> Option<&mut Formula> {
        self.binding.as_mut()
    }

    pub(crate) fn bind(&mut self, formula: Formula) {
        self.binding = Some(formula);
    }

    /// Remove the binding, keeping its last value as the literal.
    pub(crate) fn unbind(&mut self) -> Option<Formula> {
        let formula = self.binding.take()?;
        self.value = formula.value().clone();
        Some(formula)
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn read(&self) -> Result<Value, EngineError> {
        match &self.binding {
            Some(formula) => formula.read(),
            None => Ok(self.value.clone()),
        }
    }
}

/// A non-sheet object whose properties can be bound to expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    name: String,
    label: String,
    type_name: String,
    properties: BTreeMap<String, Property>,
}

impl Feature {
    pub fn new(name: &str, type_name: &str) -> Self {
        Feature {
            name: name.to_string(),
            label: name.to_string(),
            type_name: type_name.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    /// Get or create a property.
    pub(crate) fn property_entry(&mut self, name: &str) -> &mut Property {
        self.properties.entry(name.to_string()).or_default()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(name, p)| (name.as_str(), p))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Sheet(Sheet),
    Feature(Feature),
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Object::Sheet(sheet) => sheet.name(),
            Object::Feature(feature) => feature.name(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Object::Sheet(sheet) => sheet.label(),
            Object::Feature(feature) => feature.label(),
        }
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        match self {
            Object::Sheet(sheet) => sheet.set_label(label),
            Object::Feature(feature) => feature.label = label.to_string(),
        }
    }

    pub fn as_sheet(&self) -> Option<&Sheet> {
        match self {
            Object::Sheet(sheet) => Some(sheet),
            Object::Feature(_) => None,
        }
    }

    pub fn as_feature(&self) -> Option<&Feature> {
        match self {
            Object::Feature(feature) => Some(feature),
            Object::Sheet(_) => None,
        }
    }

    pub(crate) fn as_sheet_mut(&mut self) -> Option<&mut Sheet> {
        match self {
            Object::Sheet(sheet) => Some(sheet),
            Object::Feature(_) => None,
        }
    }

    pub(crate) fn as_feature_mut(&mut self) -> Option<&mut Feature> {
        match self {
            Object::Feature(feature) => Some(feature),
            Object::Sheet(_) => None,
        }
    }

    /// Every expression-bound node of this object.
    pub fn formulas(&self) -> Vec<(NodeKey, &Formula)> {
        let object = self.name().to_string();
        match self {
            Object::Sheet(sheet) => sheet
                .cells()
                .filter_map(|(address, cell)| {
                    cell.formula().map(|f| {
                        let key = NodeKey::Cell {
                            object: object.clone(),
                            address,
                        };
                        (key, f)
                    })
                })
                .collect(),
            Object::Feature(feature) => feature
                .properties()
                .filter_map(|(property, p)| {
                    p.binding().map(|f| {
                        let key = NodeKey::Property {
                            object: object.clone(),
                            property: property.to_string(),
                        };
                        (key, f)
                    })
                })
                .collect(),
        }
    }

    /// Mutable access to the formula of `key`, which must belong to this object.
    pub(crate) fn formula_mut(&mut self, key: &NodeKey) -> Option<&mut Formula> {
        match (self, key) {
            (Object::Sheet(sheet), NodeKey::Cell { address, .. }) => {
                sheet.cell_mut(*address)?.formula_mut()
            }
            (Object::Feature(feature), NodeKey::Property { property, .. }) => {
                feature.property_mut(property)?.binding_mut()
            }
            _ => None,
        }
    }

    pub fn formula(&self, key: &NodeKey) -> Option<&Formula> {
        match (self, key) {
            (Object::Sheet(sheet), NodeKey::Cell { address, .. }) => {
                sheet.cell(*address)?.formula()
            }
            (Object::Feature(feature), NodeKey::Property { property, .. }) => {
                feature.property(property)?.binding()
            }
            _ => None,
        }
    }

    pub fn status(&self) -> BindingStatus {
        BindingStatus::aggregate(self.formulas().into_iter().map(|(_, f)| f.status()))
    }
}
