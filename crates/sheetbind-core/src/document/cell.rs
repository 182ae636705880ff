//! Sheet cells.

use sheetbind_engine::engine::{EngineResult, Expression, Value};

use super::formula::{BindingStatus, Formula};

/// What a cell holds.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    /// No content; the cell exists only to carry an alias.
    Empty,
    /// A literal value together with the text it was entered as.
    Literal { input: String, value: Value },
    Formula(Formula),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub content: CellContent,
}

impl Cell {
    pub fn empty() -> Cell {
        Cell {
            content: CellContent::Empty,
        }
    }

    pub fn literal(value: Value) -> Cell {
        Cell {
            content: CellContent::Literal {
                input: value.to_input(),
                value,
            },
        }
    }

    /// Parse user input.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' -> Formula
    /// - Otherwise -> literal, see [`Value::from_input`]
    ///
    /// `last_value` seeds the cached value of a new formula.
    pub fn from_input(input: &str, last_value: Value) -> EngineResult<Cell> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Cell::empty());
        }
        if trimmed.starts_with('=') {
            let expression = Expression::parse(trimmed)?;
            return Ok(Cell {
                content: CellContent::Formula(Formula::new(expression, last_value)),
            });
        }
        Ok(Cell {
            content: CellContent::Literal {
                input: input.to_string(),
                value: Value::from_input(input),
            },
        })
    }

    /// Text to show when editing the cell.
    pub fn to_input_string(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Literal { input, .. } => input.clone(),
            CellContent::Formula(formula) => format!("={}", formula.source()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    /// Cached value (last known-good for formulas).
    pub fn value(&self) -> Value {
        match &self.content {
            CellContent::Empty => Value::Empty,
            CellContent::Literal { value, .. } => value.clone(),
            CellContent::Formula(formula) => formula.value().clone(),
        }
    }

    pub fn formula(&self) -> Option<&Formula> {
        match &self.content {
            CellContent::Formula(formula) => Some(formula),
            _ => None,
        }
    }

    pub fn formula_mut(&mut self) -> Option<&mut Formula> {
        match &mut self.content {
            CellContent::Formula(formula) => Some(formula),
            _ => None,
        }
    }

    pub fn status(&self) -> BindingStatus {
        self.formula()
            .map(Formula::status)
            .unwrap_or(BindingStatus::UpToDate)
    }
}
