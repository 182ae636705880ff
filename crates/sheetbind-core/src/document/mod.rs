//! Document model (UI-agnostic): documents, sheets, cells, features and their bindings.

mod cell;
mod formula;
mod node;
mod object;
mod sheet;
mod state;

pub use cell::{Cell, CellContent};
pub use formula::{BindingStatus, Formula, NodeState};
pub use node::{NodeKey, NodeRef};
pub use object::{Feature, Object, Property};
pub use sheet::Sheet;
pub use state::{Document, LinkTable};

use crate::error::{CoreError, Result};

/// Check that `label` can name a document or object: not empty, no surrounding whitespace
/// or control characters, and writable as `<<label>>` in an expression.
pub fn validate_label(label: &str) -> Result<()> {
    let quotable = !label.contains(">>") && !label.ends_with('>');
    if label.is_empty()
        || label.trim() != label
        || label.chars().any(char::is_control)
        || !quotable
    {
        return Err(CoreError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_label() {
        for label in ["Params", "My Box", "a<<b", "x#y.z"] {
            assert!(validate_label(label).is_ok(), "{label}");
        }
        for label in ["", " Params", "Params ", "a>>b", "arrow>", "two\nlines", "tab\there"] {
            assert!(
                matches!(validate_label(label), Err(CoreError::InvalidLabel(_))),
                "{label:?}"
            );
        }
    }
}
