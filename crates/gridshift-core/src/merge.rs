//! Merged-region tracking
//!
//! Merged regions on a sheet may never overlap and must span at least two
//! cells. Structural shifts go through the same [`ShiftOp`] range arithmetic
//! used for validation rules, so both entity kinds clip identically.

use crate::address::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::shift::ShiftOp;
use serde::{Deserialize, Serialize};

/// Overlap-safe registry of merged regions for one sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeRegistry {
    regions: Vec<CellRange>,
}

impl MergeRegistry {
    /// Register a merged region.
    ///
    /// Fails with [`Error::DegenerateMerge`] for a single-cell range and
    /// [`Error::MergeOverlap`] when the range intersects an existing region.
    pub fn register(&mut self, range: CellRange) -> Result<()> {
        if range.cell_count() < 2 {
            return Err(Error::DegenerateMerge(range.to_string()));
        }
        if let Some(existing) = self.regions.iter().find(|r| r.intersects(&range)) {
            return Err(Error::MergeOverlap(range.to_string(), existing.to_string()));
        }
        self.regions.push(range);
        Ok(())
    }

    /// Remove the region exactly matching `range`.
    ///
    /// Fails with [`Error::MergeNotFound`] when no region matches; partial
    /// overlap does not count.
    pub fn unregister(&mut self, range: &CellRange) -> Result<()> {
        match self.regions.iter().position(|r| r == range) {
            Some(i) => {
                self.regions.remove(i);
                Ok(())
            }
            None => Err(Error::MergeNotFound(range.to_string())),
        }
    }

    /// All merged regions, in registration order.
    pub fn regions(&self) -> &[CellRange] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The region containing an address, if any.
    pub fn region_containing(&self, addr: &CellAddress) -> Option<&CellRange> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    /// Apply a structural shift to every region.
    ///
    /// Regions wholly inside a deleted band are dropped; straddling regions
    /// are clipped. A region clipped down to a single cell no longer
    /// satisfies the two-cell invariant and is dropped as well.
    pub fn apply_shift(&mut self, op: &ShiftOp) {
        self.regions = self
            .regions
            .drain(..)
            .filter_map(|r| op.apply_to_range(&r))
            .filter(|r| r.cell_count() >= 2)
            .collect();
    }

    /// Drop every region lying wholly inside `range`. Returns the number of
    /// regions removed.
    pub fn remove_contained(&mut self, range: &CellRange) -> usize {
        let before = self.regions.len();
        self.regions.retain(|r| !range.contains_range(r));
        before - self.regions.len()
    }
}
