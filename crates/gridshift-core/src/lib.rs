//! # gridshift-core
//!
//! Core data structures for the gridshift spreadsheet editing engine:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`SheetGrid`] - sparse in-memory worksheet state
//! - [`MergeRegistry`] and [`ValidationRegistry`] - ranged auxiliary entities
//! - [`ShiftOp`] - the shared row/column shift arithmetic
//!
//! ## Example
//!
//! ```rust
//! use gridshift_core::{CellAddress, CellRange, SheetGrid};
//!
//! let mut grid = SheetGrid::new("Sheet1");
//! grid.set_value(CellAddress::parse("A1").unwrap(), 42.0);
//! grid.set_formula(CellAddress::parse("B1").unwrap(), "=A1*2");
//!
//! let range = CellRange::parse("A1:B1").unwrap();
//! assert_eq!(range.width(), 2);
//! ```

pub mod address;
pub mod error;
pub mod grid;
pub mod merge;
pub mod shift;
pub mod validation;

// Re-exports for convenience
pub use address::{CellAddress, CellRange, CellRangeIter};
pub use error::{Error, Result};
pub use grid::{CellValue, SheetGrid};
pub use merge::MergeRegistry;
pub use shift::{Axis, ShiftOp};
pub use validation::{ValidationKind, ValidationOperator, ValidationRegistry, ValidationRule};

/// Maximum number of rows in a worksheet (spreadsheet format limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (spreadsheet format limit)
pub const MAX_COLUMNS: u32 = 16_384;
