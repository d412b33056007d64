//! Data validation rules
//!
//! A validation rule constrains what may be entered into the cells of a
//! range. Unlike merged regions, the ranges of different rules may overlap;
//! which rule wins for rendering is not the engine's concern. The engine
//! tracks rules so structural operations keep them pointing at the right
//! cells, and exposes them for inspection.

use crate::address::{CellAddress, CellRange};
use crate::shift::ShiftOp;
use serde::{Deserialize, Serialize};

/// What kind of data a rule restricts its cells to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    WholeNumber,
    Decimal,
    List,
    Date,
    Time,
    TextLength,
    Custom,
}

impl ValidationKind {
    /// Conventional spreadsheet type name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::WholeNumber => "whole",
            ValidationKind::Decimal => "decimal",
            ValidationKind::List => "list",
            ValidationKind::Date => "date",
            ValidationKind::Time => "time",
            ValidationKind::TextLength => "textLength",
            ValidationKind::Custom => "custom",
        }
    }
}

/// Comparison operators for bounded validation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// A single validation rule applied to one range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub range: CellRange,
    pub kind: ValidationKind,
    /// Comparison operator, for kinds that take one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ValidationOperator>,
    /// First criteria value: the list source, lower bound, or custom formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value1: Option<String>,
    /// Second criteria value for between/not-between operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
    /// Whether blank entries are accepted
    #[serde(default = "default_allow_blank")]
    pub allow_blank: bool,
}

fn default_allow_blank() -> bool {
    true
}

impl ValidationRule {
    /// Create a rule of the given kind over a range, criteria unset.
    pub fn new(range: CellRange, kind: ValidationKind) -> Self {
        Self {
            range,
            kind,
            operator: None,
            value1: None,
            value2: None,
            allow_blank: true,
        }
    }

    /// Dropdown list rule; `source` is a comma-separated value list or a
    /// range reference.
    pub fn list(range: CellRange, source: impl Into<String>) -> Self {
        Self {
            value1: Some(source.into()),
            ..Self::new(range, ValidationKind::List)
        }
    }

    /// Whole-number rule with an operator and bound.
    pub fn whole_number(
        range: CellRange,
        operator: ValidationOperator,
        value1: impl Into<String>,
    ) -> Self {
        Self {
            operator: Some(operator),
            value1: Some(value1.into()),
            ..Self::new(range, ValidationKind::WholeNumber)
        }
    }

    pub fn with_value2(mut self, value2: impl Into<String>) -> Self {
        self.value2 = Some(value2.into());
        self
    }

    /// Check whether this rule covers an address.
    pub fn applies_to(&self, addr: &CellAddress) -> bool {
        self.range.contains(addr)
    }
}

/// Registry of the validation rules on one sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRegistry {
    rules: Vec<ValidationRule>,
}

impl ValidationRegistry {
    /// Add a rule. Overlap with existing rules is permitted.
    pub fn add(&mut self, rule: ValidationRule) {
        self.rules.push(rule);
    }

    /// All rules, in insertion order.
    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule applying to an address, if any.
    pub fn rule_for(&self, addr: &CellAddress) -> Option<&ValidationRule> {
        self.rules.iter().find(|r| r.applies_to(addr))
    }

    /// Apply a structural shift to every rule's range, through the same
    /// arithmetic the merge registry uses. Rules whose range is wholly
    /// deleted are dropped.
    pub fn apply_shift(&mut self, op: &ShiftOp) {
        self.rules = self
            .rules
            .drain(..)
            .filter_map(|mut rule| {
                let shifted = op.apply_to_range(&rule.range)?;
                rule.range = shifted;
                Some(rule)
            })
            .collect();
    }
}
