//! # gridshift-engine
//!
//! The mutation engine on top of [`gridshift_core`]:
//!
//! - [`rewriter`] - locating and rewriting cell references in formula text
//! - [`structural`] - row/column insertion and deletion, rectangular deletes
//! - [`copy`] - range copy with relative/absolute reference translation
//! - [`readout`] - serializable range snapshots with cell metadata
//!
//! Every mutating entry point validates its inputs up front and applies its
//! changes all-or-nothing: a returned error guarantees the grid is exactly
//! as it was.

pub mod copy;
pub mod readout;
pub mod rewriter;
pub mod structural;

pub use copy::{copy_between, copy_within};
pub use readout::{read_range, CellReadout, RangeReadout, ValidationSummary};
pub use rewriter::{check_formula, rewrite_formula, RewriteOutcome, RewritePolicy};
pub use structural::{apply_shift, delete, delete_range, insert, ShiftDirection};
