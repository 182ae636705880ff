//! Cell address parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style addresses
//! (e.g., "A1", "B2", "ZZ100") and zero-indexed row/column coordinates,
//! plus rectangular ranges used by range references and structural edits.
//!
//! # Examples
//!
//! ```
//! use sheetbind_engine::engine::CellAddress;
//!
//! let addr = CellAddress::parse("B3").unwrap();
//! assert_eq!(addr.col, 1); // 0-indexed
//! assert_eq!(addr.row, 2);
//! assert_eq!(addr.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::{EngineError, EngineResult};

/// Number of addressable rows (1..=16384 in text).
pub const MAX_ROWS: u32 = 16384;
/// Number of addressable columns (A..=ZZ).
pub const MAX_COLUMNS: u32 = 702;

/// A cell coordinate (0-indexed). Ordered row-major.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

fn address_re() -> &'static Regex {
    static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
    ADDRESS_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell address regex must compile")
    })
}

/// Column letters the grid can address (up to `ZZ`) followed by up to five digits.
fn address_syntax_re() -> &'static Regex {
    static SYNTAX_RE: OnceLock<Regex> = OnceLock::new();
    SYNTAX_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{1,2}[0-9]{1,5}$").expect("address syntax regex must compile")
    })
}

/// True if `text` reads as a cell address rather than a name: one or two column letters and
/// a row number, whether or not the row is within bounds. `alias1` is a name.
pub fn is_address_syntax(text: &str) -> bool {
    address_syntax_re().is_match(text)
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> CellAddress {
        CellAddress { row, col }
    }

    /// Parse an address from spreadsheet notation (e.g., "A1", "b2", "AA10").
    pub fn parse(text: &str) -> EngineResult<CellAddress> {
        let caps = address_re()
            .captures(text)
            .ok_or_else(|| EngineError::InvalidAddress(text.to_string()))?;
        let col = Self::parse_column(&caps["letters"])?;
        let row = Self::parse_row(&caps["numbers"])?;
        Ok(CellAddress::new(row, col))
    }

    /// Parse a 1-based row number ("2") into a 0-based row index.
    pub fn parse_row(text: &str) -> EngineResult<u32> {
        let text = text.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidAddress(text.to_string()));
        }
        let row: u64 = text
            .parse()
            .map_err(|_| EngineError::OutOfBounds(text.to_string()))?;
        if row == 0 {
            return Err(EngineError::InvalidAddress(text.to_string()));
        }
        if row > MAX_ROWS as u64 {
            return Err(EngineError::OutOfBounds(text.to_string()));
        }
        Ok((row - 1) as u32)
    }

    /// Parse column letters ("A", "ab") into a 0-based column index.
    pub fn parse_column(text: &str) -> EngineResult<u32> {
        let text = text.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(EngineError::InvalidAddress(text.to_string()));
        }
        let mut acc = 0u64;
        for c in text.to_ascii_uppercase().bytes() {
            acc = acc * 26 + (c - b'A') as u64 + 1;
            if acc > MAX_COLUMNS as u64 {
                return Err(EngineError::OutOfBounds(text.to_string()));
            }
        }
        Ok((acc - 1) as u32)
    }

    /// Convert a column index to letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col as u64 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Move the address by the given deltas. Never clamps: leaving the grid is an error.
    pub fn shift(self, row_delta: i64, col_delta: i64) -> EngineResult<CellAddress> {
        let row = self.row as i64 + row_delta;
        let col = self.col as i64 + col_delta;
        if row < 0 || col < 0 || row >= MAX_ROWS as i64 || col >= MAX_COLUMNS as i64 {
            return Err(EngineError::OutOfBounds(format!(
                "{} shifted by ({}, {})",
                self, row_delta, col_delta
            )));
        }
        Ok(CellAddress::new(row as u32, col as u32))
    }
}

impl std::str::FromStr for CellAddress {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellAddress::parse(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellAddress::col_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular block of cells, stored normalized (start is top-left).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn new(a: CellAddress, b: CellAddress) -> CellRange {
        CellRange {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse a range like "A1:B5".
    pub fn parse(text: &str) -> EngineResult<CellRange> {
        let (a, b) = text
            .split_once(':')
            .ok_or_else(|| EngineError::InvalidAddress(text.to_string()))?;
        Ok(CellRange::new(CellAddress::parse(a)?, CellAddress::parse(b)?))
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn columns(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Number of cells covered.
    pub fn len(&self) -> usize {
        self.rows() as usize * self.columns() as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Row-major iteration over every address in the range.
    pub fn iter(self) -> impl Iterator<Item = CellAddress> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellAddress::new(row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
