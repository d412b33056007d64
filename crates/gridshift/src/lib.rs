//! # gridshift
//!
//! Spreadsheet structural editing with reference consistency: insert and
//! delete rows/columns, copy ranges, and manage merges and validation rules
//! while every formula reference, merged region, and validation range keeps
//! pointing at the cells it meant.
//!
//! The facade is [`SheetOps`], generic over a [`WorkbookStore`]; the crate
//! ships [`JsonWorkbookStore`] for single-file JSON workbooks.
//!
//! ## Example
//!
//! ```no_run
//! use gridshift::{JsonWorkbookStore, SheetOps};
//!
//! # fn main() -> Result<(), gridshift::OpError> {
//! let ops = SheetOps::new(JsonWorkbookStore::new("book.json"));
//! ops.create_sheet("Data")?;
//! ops.apply_formula("Data", "B1", "=A1*2")?;
//! ops.insert_rows("Data", 1, 1)?; // B1's formula becomes =A2*2, now at B2
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ops;
pub mod store;

pub use config::EngineConfig;
pub use error::{OpError, OpResult};
pub use ops::SheetOps;
pub use store::{JsonWorkbookStore, StoreError, WorkbookStore};

// The core vocabulary, re-exported so most callers need only this crate
pub use gridshift_core::{
    Axis, CellAddress, CellRange, CellValue, SheetGrid, ValidationKind, ValidationOperator,
    ValidationRule, MAX_COLUMNS, MAX_ROWS,
};
pub use gridshift_engine::{RangeReadout, ShiftDirection};
