//! Dependency extraction helpers.
//!
//! Turns reference targets into the concrete cell addresses a node depends on.
//! Ranges are expanded cell by cell up to a configurable size; larger ranges are reported
//! as [`CellTargets::Sparse`] so the caller can register only cells that actually exist.

use super::address::{CellAddress, CellRange};
use super::ast::{RefTarget, Reference};

/// Largest range expanded cell by cell when building dependencies.
pub const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellTargets {
    /// Every address named by the reference.
    Cells(Vec<CellAddress>),
    /// A range too large to expand; depend on its occupied cells only.
    Sparse(CellRange),
    /// The target is a name (alias or property) to be looked up by the caller.
    Named(String),
}

/// Addresses referenced by `reference`, expanding ranges of at most `max_range_cells`.
pub fn cell_targets(reference: &Reference, max_range_cells: usize) -> CellTargets {
    match &reference.target {
        RefTarget::Cell(addr) => CellTargets::Cells(vec![*addr]),
        RefTarget::Range(range) if range.len() <= max_range_cells => {
            CellTargets::Cells(range.iter().collect())
        }
        RefTarget::Range(range) => CellTargets::Sparse(*range),
        RefTarget::Name(name) => CellTargets::Named(name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Expression;

    fn first_reference(src: &str) -> Reference {
        let expr = Expression::parse(src).unwrap();
        expr.references()[0].clone()
    }

    #[test]
    fn test_single_cell() {
        let r = first_reference("B2 + 1");
        assert_eq!(cell_targets(&r, 10), CellTargets::Cells(vec![CellAddress::new(1, 1)]));
    }

    #[test]
    fn test_small_range_is_expanded() {
        let r = first_reference("SUM(A1:B2)");
        let CellTargets::Cells(cells) = cell_targets(&r, 10) else {
            panic!("expected cells");
        };
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[1], CellAddress::new(0, 1));
    }

    #[test]
    fn test_large_range_is_sparse() {
        let r = first_reference("SUM(A1:Z100)");
        assert!(matches!(cell_targets(&r, 100), CellTargets::Sparse(_)));
    }

    #[test]
    fn test_names_are_left_to_the_caller() {
        let r = first_reference("Sheet.alias1");
        assert_eq!(cell_targets(&r, 10), CellTargets::Named("alias1".to_string()));
    }
}
