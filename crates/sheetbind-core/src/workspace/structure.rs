//! Row and column insertion and removal.
//!
//! An edit is planned in full against the current state (the new cell map, the new alias
//! table and the rewritten text of every affected expression) and only committed once
//! every piece has been computed. Any failure leaves the workspace as it was.

use std::collections::BTreeMap;

use sheetbind_engine::engine::{
    CellAddress, EngineError, EngineResult, Expression, RefTarget, Reference, Rewrite,
    ShiftOperation, Shifted,
};
use tracing::debug;

use super::Workspace;
use crate::document::{Cell, NodeKey, NodeRef};
use crate::error::Result;

fn moved_to(op: &ShiftOperation, address: CellAddress) -> EngineResult<Option<CellAddress>> {
    Ok(match op.map_address(address)? {
        Shifted::Unchanged => Some(address),
        Shifted::Moved(to) => Some(to),
        Shifted::Deleted => None,
    })
}

/// How one reference into the edited sheet changes.
fn shift_reference(op: &ShiftOperation, reference: &Reference) -> EngineResult<Rewrite> {
    let target = match &reference.target {
        RefTarget::Cell(address) => match op.map_address(*address)? {
            Shifted::Unchanged => return Ok(Rewrite::Keep),
            Shifted::Moved(to) => RefTarget::Cell(to),
            Shifted::Deleted => return Ok(Rewrite::Invalidate),
        },
        RefTarget::Range(range) => match op.map_range(*range)? {
            Shifted::Unchanged => return Ok(Rewrite::Keep),
            Shifted::Moved(to) => RefTarget::Range(to),
            Shifted::Deleted => return Ok(Rewrite::Invalidate),
        },
        RefTarget::Name(_) => return Ok(Rewrite::Keep),
    };
    Ok(Rewrite::Replace(Reference {
        target,
        ..reference.clone()
    }))
}

impl Workspace {
    /// Insert `count` empty rows before row `before` (0-based).
    pub fn insert_rows(
        &mut self,
        document: &str,
        sheet: &str,
        before: u32,
        count: u32,
    ) -> Result<()> {
        self.structural_edit(document, sheet, ShiftOperation::InsertRows { before, count })
    }

    /// Remove `count` rows starting at row `start` (0-based).
    pub fn remove_rows(
        &mut self,
        document: &str,
        sheet: &str,
        start: u32,
        count: u32,
    ) -> Result<()> {
        self.structural_edit(document, sheet, ShiftOperation::RemoveRows { start, count })
    }

    pub fn insert_columns(
        &mut self,
        document: &str,
        sheet: &str,
        before: u32,
        count: u32,
    ) -> Result<()> {
        self.structural_edit(document, sheet, ShiftOperation::InsertColumns { before, count })
    }

    pub fn remove_columns(
        &mut self,
        document: &str,
        sheet: &str,
        start: u32,
        count: u32,
    ) -> Result<()> {
        self.structural_edit(document, sheet, ShiftOperation::RemoveColumns { start, count })
    }

    /// Rewritten expressions for every binding that reads the edited sheet.
    fn plan_shift_rewrites(
        &self,
        doc: usize,
        object: usize,
        op: &ShiftOperation,
    ) -> Result<Vec<(NodeRef, Expression)>> {
        let mut rewrites = Vec::new();
        for node in self.formula_nodes() {
            let Some(formula) = self.formula(&node) else {
                continue;
            };
            let mut failure: Option<EngineError> = None;
            let rewritten = formula.expression().rewrite(|reference| {
                match self.resolve_object(&node.document, node.object(), reference) {
                    Ok(target) if target.doc == doc && target.object == object => {
                        shift_reference(op, reference).unwrap_or_else(|e| {
                            if failure.is_none() {
                                failure = Some(e);
                            }
                            Rewrite::Keep
                        })
                    }
                    _ => Rewrite::Keep,
                }
            })?;
            if let Some(e) = failure {
                return Err(e.into());
            }
            if let Some(expression) = rewritten {
                rewrites.push((node, expression));
            }
        }
        Ok(rewrites)
    }

    fn structural_edit(&mut self, document: &str, sheet: &str, op: ShiftOperation) -> Result<()> {
        op.validate()?;
        let (doc, object) = self.sheet_index(document, sheet)?;
        if op.is_noop() {
            return Ok(());
        }
        let doc_name = self.documents[doc].name().to_string();
        let current = self.sheet_at(doc, object)?;
        let sheet_name = current.name().to_string();
        debug!(document = %doc_name, sheet = %sheet_name, edit = %op, "structural edit");

        let mut cells: BTreeMap<CellAddress, Cell> = BTreeMap::new();
        for (address, cell) in current.cells() {
            if let Some(to) = moved_to(&op, address)? {
                cells.insert(to, cell.clone());
            }
        }
        let aliases = current
            .aliases()
            .remap(|address| moved_to(&op, address).ok().flatten());
        let rewrites = self.plan_shift_rewrites(doc, object, &op)?;

        // Commit: bindings inside the edited sheet are rewritten at their new address.
        let mut touched = Vec::new();
        let mut elsewhere = Vec::new();
        for (node, expression) in rewrites {
            match &node.key {
                NodeKey::Cell { object, address }
                    if node.document == doc_name && *object == sheet_name =>
                {
                    if let Some(to) = moved_to(&op, *address)? {
                        if let Some(formula) = cells.get_mut(&to).and_then(Cell::formula_mut) {
                            formula.set_expression(expression);
                        }
                    }
                }
                _ => elsewhere.push((node, expression)),
            }
        }
        self.sheet_at_mut(doc, object)?.replace(cells, aliases);
        self.documents[doc].modified = true;
        for (node, expression) in elsewhere {
            if let Some(formula) = self.formula_mut(&node) {
                formula.set_expression(expression);
            }
            if let Some(document) = self.doc_by_name_mut(&node.document) {
                document.modified = true;
            }
            touched.push(node);
        }

        touched.extend(
            self.documents[doc]
                .object_at(object)
                .formulas()
                .into_iter()
                .map(|(key, _)| NodeRef {
                    document: doc_name.clone(),
                    key,
                }),
        );
        self.after_edit(touched);
        Ok(())
    }
}
