//! Sparse in-memory worksheet state
//!
//! A [`SheetGrid`] is the working state for one worksheet during a single
//! engine operation: cell contents keyed by address (unset cells are absent),
//! plus the sheet's merged regions and validation rules. It is constructed
//! from a store's persisted representation, mutated in place, and handed
//! back for persistence; the engine holds no state across operations.

use std::collections::BTreeMap;
use std::fmt;

use crate::address::{CellAddress, CellRange};
use crate::merge::MergeRegistry;
use crate::validation::ValidationRegistry;
use serde::{Deserialize, Serialize};

/// The content of a single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    /// Formula text including the leading `=`
    Formula(String),
    /// A formula whose referenced cells were removed by a structural
    /// deletion. Displays as `#REF!` while keeping the original text.
    BrokenFormula { original: String, reason: String },
}

impl CellValue {
    /// Create a formula value, prefixing `=` when missing.
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        if text.starts_with('=') {
            CellValue::Formula(text)
        } else {
            CellValue::Formula(format!("={}", text))
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, CellValue::BrokenFormula { .. })
    }

    /// Formula text for live formula cells.
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => write!(f, "TRUE"),
            CellValue::Bool(false) => write!(f, "FALSE"),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Formula(text) => write!(f, "{}", text),
            CellValue::BrokenFormula { .. } => write!(f, "#REF!"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Sparse row-major storage for one worksheet
///
/// Structure: `BTreeMap<row, BTreeMap<column, CellValue>>`, rows and columns
/// 1-based. Only set cells are stored; clearing a cell removes its entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    name: String,
    #[serde(default)]
    cells: BTreeMap<u32, BTreeMap<u32, CellValue>>,
    #[serde(default)]
    merges: MergeRegistry,
    #[serde(default)]
    validations: ValidationRegistry,
}

impl SheetGrid {
    /// Create an empty grid for the named sheet.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: MergeRegistry::default(),
            validations: ValidationRegistry::default(),
        }
    }

    /// Sheet name this grid was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Get a cell's content, if set.
    pub fn value(&self, addr: &CellAddress) -> Option<&CellValue> {
        self.cells.get(&addr.row).and_then(|r| r.get(&addr.column))
    }

    /// Set a cell's content, replacing any previous value.
    pub fn set_value<V: Into<CellValue>>(&mut self, addr: CellAddress, value: V) {
        self.cells
            .entry(addr.row)
            .or_default()
            .insert(addr.column, value.into());
    }

    /// Set a formula cell (leading `=` added when missing).
    pub fn set_formula(&mut self, addr: CellAddress, formula: &str) {
        self.set_value(addr, CellValue::formula(formula));
    }

    /// Remove a cell, returning its previous content.
    pub fn clear(&mut self, addr: &CellAddress) -> Option<CellValue> {
        let row = self.cells.get_mut(&addr.row)?;
        let value = row.remove(&addr.column);
        if row.is_empty() {
            self.cells.remove(&addr.row);
        }
        value
    }

    /// Number of set cells.
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounds of all set cells, or `None` for an empty sheet.
    pub fn used_range(&self) -> Option<CellRange> {
        let min_row = *self.cells.keys().next()?;
        let max_row = *self.cells.keys().next_back()?;

        let mut min_col = u32::MAX;
        let mut max_col = 0u32;
        for row in self.cells.values() {
            if let Some(&c) = row.keys().next() {
                min_col = min_col.min(c);
            }
            if let Some(&c) = row.keys().next_back() {
                max_col = max_col.max(c);
            }
        }

        Some(CellRange::new(
            CellAddress::new(min_col, min_row),
            CellAddress::new(max_col, max_row),
        ))
    }

    /// Iterate over all set cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellValue)> {
        self.cells.iter().flat_map(|(&row, cols)| {
            cols.iter()
                .map(move |(&col, value)| (CellAddress::new(col, row), value))
        })
    }

    /// Iterate over formula cells: (address, formula text).
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.iter()
            .filter_map(|(addr, value)| value.formula_text().map(|text| (addr, text)))
    }

    /// Addresses of all set cells (for callers that need to mutate while
    /// walking in a specific order).
    pub fn addresses(&self) -> Vec<CellAddress> {
        self.iter().map(|(addr, _)| addr).collect()
    }

    /// Merged regions on this sheet.
    pub fn merges(&self) -> &MergeRegistry {
        &self.merges
    }

    pub fn merges_mut(&mut self) -> &mut MergeRegistry {
        &mut self.merges
    }

    /// Validation rules on this sheet.
    pub fn validations(&self) -> &ValidationRegistry {
        &self.validations
    }

    pub fn validations_mut(&mut self) -> &mut ValidationRegistry {
        &mut self.validations
    }
}
