//! Error types for gridshift-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by address parsing, range handling, and the merge registry.
///
/// Every variant describes a problem with caller-supplied input; all of them
/// are detected before any grid state is mutated.
#[derive(Debug, Error)]
pub enum Error {
    /// Address or range text that does not parse
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    /// Row coordinate outside 1..=MAX_ROWS
    #[error("Row {0} out of bounds (valid: 1..={1})")]
    RowOutOfBounds(i64, u32),

    /// Column coordinate outside 1..=MAX_COLUMNS
    #[error("Column {0} out of bounds (valid: 1..={1})")]
    ColumnOutOfBounds(i64, u32),

    /// Structural operation start position below 1
    #[error("Invalid position {0}: positions are 1-based")]
    InvalidPosition(u32),

    /// Structural operation count below 1
    #[error("Invalid count {0}: must insert or delete at least one row/column")]
    InvalidCount(u32),

    /// Merge request intersects an existing merged region
    #[error("Range {0} overlaps existing merged region {1}")]
    MergeOverlap(String, String),

    /// Merge request covers fewer than two cells
    #[error("Cannot merge {0}: a merged region must span at least two cells")]
    DegenerateMerge(String),

    /// Unmerge request with no exactly matching region
    #[error("No merged region matches {0}")]
    MergeNotFound(String),
}
