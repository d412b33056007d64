//! Structural shift arithmetic
//!
//! A [`ShiftOp`] describes a whole-row or whole-column insertion or deletion.
//! The same arithmetic is applied to cell positions, merged regions, and
//! validation ranges so that every ranged entity clips and moves identically.

use crate::address::{CellAddress, CellRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The axis a structural operation works along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    /// The coordinate of an address along this axis.
    pub fn coord_of(&self, addr: &CellAddress) -> u32 {
        match self {
            Axis::Row => addr.row,
            Axis::Column => addr.column,
        }
    }

    /// Rebuild an address with the coordinate along this axis replaced.
    pub fn with_coord(&self, addr: &CellAddress, coord: u32) -> CellAddress {
        match self {
            Axis::Row => CellAddress::new(addr.column, coord),
            Axis::Column => CellAddress::new(coord, addr.row),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// A whole-row/column insertion or deletion, positions 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    /// Insert `count` rows/columns before position `at`.
    Insert { axis: Axis, at: u32, count: u32 },
    /// Delete the band `[start, start + count)` of rows/columns.
    Delete { axis: Axis, start: u32, count: u32 },
}

impl ShiftOp {
    /// The axis this operation works along.
    pub fn axis(&self) -> Axis {
        match *self {
            ShiftOp::Insert { axis, .. } | ShiftOp::Delete { axis, .. } => axis,
        }
    }

    /// Shift a single 1-based coordinate along the operation's axis.
    ///
    /// Returns `None` when the coordinate lies inside a deleted band.
    pub fn apply_to_coord(&self, pos: u32) -> Option<u32> {
        match *self {
            ShiftOp::Insert { at, count, .. } => {
                if pos >= at {
                    Some(pos + count)
                } else {
                    Some(pos)
                }
            }
            ShiftOp::Delete { start, count, .. } => {
                if pos >= start + count {
                    Some(pos - count)
                } else if pos >= start {
                    None
                } else {
                    Some(pos)
                }
            }
        }
    }

    /// Shift an address. `None` means the cell was deleted.
    pub fn apply_to_address(&self, addr: &CellAddress) -> Option<CellAddress> {
        let axis = self.axis();
        self.apply_to_coord(axis.coord_of(addr))
            .map(|c| axis.with_coord(addr, c))
    }

    /// Shift a range, clipping it against a deleted band.
    ///
    /// Insertion moves the corners independently: a range lying wholly at or
    /// beyond the insertion point shifts, one straddling it has only the far
    /// corner shifted (widening it). Deletion removes the part of the extent
    /// inside the band; a range wholly inside is dropped (`None`).
    pub fn apply_to_range(&self, range: &CellRange) -> Option<CellRange> {
        let axis = self.axis();
        let lo = axis.coord_of(&range.start);
        let hi = axis.coord_of(&range.end);

        let (lo, hi) = match *self {
            ShiftOp::Insert { at, count, .. } => {
                let lo = if lo >= at { lo + count } else { lo };
                let hi = if hi >= at { hi + count } else { hi };
                (lo, hi)
            }
            ShiftOp::Delete { start, count, .. } => {
                let band_end = start + count; // exclusive
                if lo >= start && hi < band_end {
                    return None;
                }
                let lo = if lo >= band_end {
                    lo - count
                } else if lo >= start {
                    start
                } else {
                    lo
                };
                let hi = if hi >= band_end {
                    hi - count
                } else if hi >= start {
                    start - 1
                } else {
                    hi
                };
                if hi < lo || hi == 0 {
                    return None;
                }
                (lo, hi)
            }
        };

        Some(CellRange::new(
            axis.with_coord(&range.start, lo),
            axis.with_coord(&range.end, hi),
        ))
    }
}
