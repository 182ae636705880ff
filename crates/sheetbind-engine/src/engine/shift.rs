//! Address and range arithmetic for row/column insertion and removal.
//!
//! Rules:
//! - Insert at R: addresses with row >= R move down by `count`.
//! - Remove `count` rows from R: rows inside the span are deleted, rows past it move up.
//! - Ranges grow or shrink at their edges; a range entirely inside a removed span is deleted.
//! - Same logic for columns.
//!
//! Pushing an address past the grid limits is an `OutOfBounds` error, never a clamp.

use super::address::{CellAddress, CellRange, MAX_COLUMNS, MAX_ROWS};
use super::error::{EngineError, EngineResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRows { before: u32, count: u32 },
    RemoveRows { start: u32, count: u32 },
    InsertColumns { before: u32, count: u32 },
    RemoveColumns { start: u32, count: u32 },
}

/// Result of mapping an address or range through a [`ShiftOperation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shifted<T> {
    Unchanged,
    Moved(T),
    Deleted,
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Columns,
}

impl Axis {
    fn limit(self) -> u32 {
        match self {
            Axis::Rows => MAX_ROWS,
            Axis::Columns => MAX_COLUMNS,
        }
    }

    fn get(self, addr: CellAddress) -> u32 {
        match self {
            Axis::Rows => addr.row,
            Axis::Columns => addr.col,
        }
    }

    fn with(self, addr: CellAddress, value: u32) -> CellAddress {
        match self {
            Axis::Rows => CellAddress::new(value, addr.col),
            Axis::Columns => CellAddress::new(addr.row, value),
        }
    }
}

impl ShiftOperation {
    fn parts(&self) -> (Axis, bool, u32, u32) {
        match *self {
            ShiftOperation::InsertRows { before, count } => (Axis::Rows, true, before, count),
            ShiftOperation::RemoveRows { start, count } => (Axis::Rows, false, start, count),
            ShiftOperation::InsertColumns { before, count } => {
                (Axis::Columns, true, before, count)
            }
            ShiftOperation::RemoveColumns { start, count } => {
                (Axis::Columns, false, start, count)
            }
        }
    }

    /// Check the edit point and span against the grid limits.
    pub fn validate(&self) -> EngineResult<()> {
        let (axis, insert, at, count) = self.parts();
        let limit = axis.limit() as u64;
        let in_bounds = if insert {
            (at as u64) < limit && (at as u64 + count as u64) <= limit
        } else {
            (at as u64 + count as u64) <= limit
        };
        if in_bounds {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds(self.to_string()))
        }
    }

    /// True when the operation moves or deletes nothing.
    pub fn is_noop(&self) -> bool {
        self.parts().3 == 0
    }

    /// Map a single coordinate. `None` means it falls inside a removed span.
    fn map_index(&self, index: u32) -> EngineResult<Option<u32>> {
        let (axis, insert, at, count) = self.parts();
        if index < at {
            return Ok(Some(index));
        }
        if insert {
            let moved = index as u64 + count as u64;
            if moved >= axis.limit() as u64 {
                return Err(EngineError::OutOfBounds(format!(
                    "{} pushes index {} past the grid",
                    self,
                    index + 1
                )));
            }
            Ok(Some(moved as u32))
        } else if (index as u64) < at as u64 + count as u64 {
            Ok(None)
        } else {
            Ok(Some(index - count))
        }
    }

    /// Where a cell at `addr` ends up.
    pub fn map_address(&self, addr: CellAddress) -> EngineResult<Shifted<CellAddress>> {
        let axis = self.parts().0;
        match self.map_index(axis.get(addr))? {
            None => Ok(Shifted::Deleted),
            Some(index) if index == axis.get(addr) => Ok(Shifted::Unchanged),
            Some(index) => Ok(Shifted::Moved(axis.with(addr, index))),
        }
    }

    /// Where a range ends up. Ranges shrink when an edge falls inside a removed span.
    pub fn map_range(&self, range: CellRange) -> EngineResult<Shifted<CellRange>> {
        let (axis, _, at, _) = self.parts();
        let first = axis.get(range.start);
        let last = axis.get(range.end);
        let new_first = self.map_index(first)?;
        let new_last = self.map_index(last)?;
        let (new_first, new_last) = match (new_first, new_last) {
            (Some(a), Some(b)) => (a, b),
            // Start removed: the range begins at the first surviving index.
            (None, Some(b)) => (at, b),
            // End removed: the range stops just before the removed span.
            (Some(a), None) => (a, at - 1),
            (None, None) => return Ok(Shifted::Deleted),
        };
        if new_first == first && new_last == last {
            return Ok(Shifted::Unchanged);
        }
        Ok(Shifted::Moved(CellRange::new(
            axis.with(range.start, new_first),
            axis.with(range.end, new_last),
        )))
    }
}

impl std::fmt::Display for ShiftOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            ShiftOperation::InsertRows { before, count } => {
                write!(f, "insert {} row(s) before row {}", count, before + 1)
            }
            ShiftOperation::RemoveRows { start, count } => {
                write!(f, "remove {} row(s) from row {}", count, start + 1)
            }
            ShiftOperation::InsertColumns { before, count } => write!(
                f,
                "insert {} column(s) before column {}",
                count,
                CellAddress::col_to_letters(before)
            ),
            ShiftOperation::RemoveColumns { start, count } => write!(
                f,
                "remove {} column(s) from column {}",
                count,
                CellAddress::col_to_letters(start)
            ),
        }
    }
}
