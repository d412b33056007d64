//! Range readout with cell-level metadata
//!
//! Produces a serializable snapshot of a range: each set cell's display
//! value and formula text, the validation rule constraining it, and the
//! merged region it belongs to. Unset cells are omitted; the grid is sparse
//! and so is the readout.

use gridshift_core::{CellAddress, CellRange, CellValue, SheetGrid, ValidationRule};
use serde::Serialize;

/// Snapshot of one range on one sheet
#[derive(Debug, Clone, Serialize)]
pub struct RangeReadout {
    pub sheet: String,
    pub range: String,
    pub cells: Vec<CellReadout>,
}

/// One set cell inside a readout
#[derive(Debug, Clone, Serialize)]
pub struct CellReadout {
    pub address: String,
    pub row: u32,
    pub column: u32,
    /// Display value: formula text for live formulas, `#REF!` for broken ones
    pub value: String,
    /// Formula text, also present for broken formulas (their original text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSummary>,
    /// Merged region containing this cell, in A1 form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<String>,
}

/// Flattened view of a validation rule for readouts
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<gridshift_core::ValidationOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
    pub allow_blank: bool,
}

impl From<&ValidationRule> for ValidationSummary {
    fn from(rule: &ValidationRule) -> Self {
        Self {
            kind: rule.kind.as_str().to_string(),
            operator: rule.operator,
            value1: rule.value1.clone(),
            value2: rule.value2.clone(),
            allow_blank: rule.allow_blank,
        }
    }
}

/// Read every set cell of `range` with its metadata, row-major.
pub fn read_range(grid: &SheetGrid, range: &CellRange) -> RangeReadout {
    let cells = range
        .iter()
        .filter_map(|addr| grid.value(&addr).map(|value| cell_readout(grid, addr, value)))
        .collect();

    RangeReadout {
        sheet: grid.name().to_string(),
        range: range.to_a1_string(),
        cells,
    }
}

fn cell_readout(grid: &SheetGrid, addr: CellAddress, value: &CellValue) -> CellReadout {
    let formula = match value {
        CellValue::Formula(text) => Some(text.clone()),
        CellValue::BrokenFormula { original, .. } => Some(original.clone()),
        _ => None,
    };

    CellReadout {
        address: addr.to_a1_string(),
        row: addr.row,
        column: addr.column,
        value: value.to_string(),
        formula,
        validation: grid.validations().rule_for(&addr).map(ValidationSummary::from),
        merged_into: grid
            .merges()
            .region_containing(&addr)
            .map(|r| r.to_a1_string()),
    }
}
