use std::fmt;

use sheetbind_engine::engine::{CellAddress, render_qualifier};

/// A bindable node inside one document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Cell { object: String, address: CellAddress },
    Property { object: String, property: String },
}

impl NodeKey {
    /// Durable name of the object owning the node.
    pub fn object(&self) -> &str {
        match self {
            NodeKey::Cell { object, .. } | NodeKey::Property { object, .. } => object,
        }
    }
}

/// A node qualified by the durable name of its document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef {
    pub document: String,
    pub key: NodeKey,
}

impl NodeRef {
    pub fn cell(document: &str, object: &str, address: CellAddress) -> Self {
        NodeRef {
            document: document.to_string(),
            key: NodeKey::Cell {
                object: object.to_string(),
                address,
            },
        }
    }

    pub fn property(document: &str, object: &str, property: &str) -> Self {
        NodeRef {
            document: document.to_string(),
            key: NodeKey::Property {
                object: object.to_string(),
                property: property.to_string(),
            },
        }
    }

    pub fn object(&self) -> &str {
        self.key.object()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}.",
            render_qualifier(&self.document),
            render_qualifier(self.object())
        )?;
        match &self.key {
            NodeKey::Cell { address, .. } => write!(f, "{}", address),
            NodeKey::Property { property, .. } => write!(f, "{}", property),
        }
    }
}
