//! Spreadsheet engine API.
//!
//! This module provides the document-independent half of the spreadsheet:
//!
//! - [`CellAddress`], [`CellRange`] - A1 notation to row/col indices and back
//! - [`AliasTable`] - Bijective alias name to address mapping
//! - [`Expression`], [`Expr`], [`Reference`] - Parsed expressions with span-carrying references
//! - [`evaluate`], [`Resolver`] - Expression evaluation against caller-provided values
//! - [`ShiftOperation`] - Address arithmetic for row/column insertion and removal
//! - [`DependencyGraph`], [`schedule`], [`detect_cycle`] - Dependency bookkeeping
//! - [`Value`], [`format_value`] - Runtime values and their display
//! - [`BUILTINS`] - The built-in function table

mod address;
mod alias;
mod ast;
mod cycle;
mod deps;
mod error;
mod eval;
mod graph;
mod lexer;
mod parser;
mod shift;
mod value;

pub use address::{CellAddress, CellRange, MAX_COLUMNS, MAX_ROWS, is_address_syntax};
pub use alias::{AliasTable, is_identifier, is_keyword, validate_alias_name};
pub use ast::{BinaryOp, Expr, Expression, RefTarget, Reference, Rewrite, UnaryOp, render_qualifier};
pub use cycle::detect_cycle;
pub use deps::{CellTargets, MAX_DEPENDENCY_RANGE_CELLS, cell_targets};
pub use error::{EngineError, EngineResult, ErrorKind, Span};
pub use eval::{Resolver, evaluate};
pub use graph::{DependencyDelta, DependencyGraph, Schedule, schedule, transitive_dependents};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::parse_expr;
pub use shift::{ShiftOperation, Shifted};
pub use value::{Value, format_number, format_value};

pub use crate::builtins::{BUILTINS, Builtin};
