//! File format handling.
//!
//! One document per file, UTF-8, line based:
//!
//! ```text
//! # sheetbind document
//! @label Main
//! @link <<Other Doc>>#Params = other#Spreadsheet
//!
//! [sheet Spreadsheet]
//! A1: 10
//! A2: =A1 * 2
//! @alias A1 width
//!
//! [feature Box Part::Box]
//! Length: =Spreadsheet.width
//! ```
//!
//! Expressions are stored as source text and re-parsed on load.

mod parser;
mod writer;

pub use parser::{parse_document, parse_document_content};
pub use writer::{write_document, write_document_content};
