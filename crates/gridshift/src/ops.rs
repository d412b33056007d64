//! The operation facade
//!
//! [`SheetOps`] ties the pieces together: each operation loads the affected
//! sheet from the store, applies one engine mutation, and persists the
//! result. Mutations are all-or-nothing in memory and the store saves
//! atomically, so a failed operation never leaves a sheet half-updated.
//!
//! Callers serialize operations per workbook; the facade itself keeps no
//! state between calls.

use gridshift_core::{Axis, CellAddress, CellRange, CellValue, SheetGrid, ValidationRule};
use gridshift_engine::{
    check_formula, copy_between, copy_within, read_range, RangeReadout, ShiftDirection,
};
use log::info;

use crate::config::EngineConfig;
use crate::error::OpResult;
use crate::store::WorkbookStore;

/// High-level spreadsheet operations over a [`WorkbookStore`]
pub struct SheetOps<S: WorkbookStore> {
    store: S,
    config: EngineConfig,
}

impl<S: WorkbookStore> SheetOps<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn load(&self, sheet: &str) -> OpResult<SheetGrid> {
        Ok(self.store.load(sheet)?)
    }

    fn persist(&self, grid: &SheetGrid) -> OpResult<()> {
        Ok(self.store.save(grid)?)
    }

    /// Set a formula cell after checking the formula's structure. A missing
    /// `=` prefix is added rather than rejected.
    pub fn apply_formula(&self, sheet: &str, cell: &str, formula: &str) -> OpResult<String> {
        let addr = CellAddress::parse(cell)?;
        let text = normalize_formula(formula);
        check_formula(&text)?;

        let mut grid = self.load(sheet)?;
        grid.set_formula(addr, &text);
        self.persist(&grid)?;

        info!("applied formula to {}!{}", sheet, addr);
        Ok(format!("Applied formula {:?} to {} on {}", text, addr, sheet))
    }

    /// Check a formula's structure and its target without writing anything:
    /// the cell address must parse and the sheet must exist.
    pub fn validate_formula(&self, sheet: &str, cell: &str, formula: &str) -> OpResult<String> {
        let addr = CellAddress::parse(cell)?;
        let text = normalize_formula(formula);
        check_formula(&text)?;
        self.load(sheet)?;
        Ok(format!(
            "Formula {:?} is structurally valid for {} on {}",
            text, addr, sheet
        ))
    }

    /// Read a range with cell metadata. With `end` unset, a lone start cell
    /// expands to the sheet's populated extent.
    pub fn read_range(&self, sheet: &str, start: &str, end: Option<&str>) -> OpResult<RangeReadout> {
        let grid = self.load(sheet)?;
        let range = match end {
            Some(end) => CellRange::new(CellAddress::parse(start)?, CellAddress::parse(end)?),
            None => CellRange::parse_with_default_end(start, grid.used_range().map(|u| u.end))?,
        };
        Ok(read_range(&grid, &range))
    }

    /// Write a rectangle of plain values starting at `start`, row-major.
    ///
    /// Strings beginning with `=` are stored as formulas, matching how a
    /// spreadsheet treats typed input; a `None` entry clears the target
    /// cell. Fails before writing anything if the rectangle would not fit
    /// the sheet.
    pub fn write_values(
        &self,
        sheet: &str,
        start: &str,
        rows: &[Vec<Option<CellValue>>],
    ) -> OpResult<String> {
        let anchor = CellAddress::parse(start)?;

        let height = rows.len() as i64;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as i64;
        if height == 0 || width == 0 {
            return Ok(format!("Wrote 0 cell(s) at {} on {}", anchor, sheet));
        }
        anchor.offset(width - 1, height - 1)?;

        let mut grid = self.load(sheet)?;
        let mut written = 0usize;
        for (r, row) in rows.iter().enumerate() {
            for (c, entry) in row.iter().enumerate() {
                let target = anchor.offset(c as i64, r as i64)?;
                match entry {
                    None => {
                        grid.clear(&target);
                    }
                    Some(CellValue::Text(s)) if s.starts_with('=') => {
                        grid.set_formula(target, s);
                        written += 1;
                    }
                    Some(value) => {
                        grid.set_value(target, value.clone());
                        written += 1;
                    }
                }
            }
        }
        self.persist(&grid)?;

        info!("wrote {} cell(s) at {}!{}", written, sheet, anchor);
        Ok(format!(
            "Wrote {} cell(s) starting at {} on {}",
            written, anchor, sheet
        ))
    }

    pub fn insert_rows(&self, sheet: &str, at: u32, count: u32) -> OpResult<String> {
        self.structural(sheet, Axis::Row, at, count, true)
    }

    pub fn insert_columns(&self, sheet: &str, at: u32, count: u32) -> OpResult<String> {
        self.structural(sheet, Axis::Column, at, count, true)
    }

    pub fn delete_rows(&self, sheet: &str, start: u32, count: u32) -> OpResult<String> {
        self.structural(sheet, Axis::Row, start, count, false)
    }

    pub fn delete_columns(&self, sheet: &str, start: u32, count: u32) -> OpResult<String> {
        self.structural(sheet, Axis::Column, start, count, false)
    }

    fn structural(
        &self,
        sheet: &str,
        axis: Axis,
        pos: u32,
        count: u32,
        inserting: bool,
    ) -> OpResult<String> {
        let mut grid = self.load(sheet)?;
        let shift_absolute = self.config.shift_absolute_refs;
        if inserting {
            gridshift_engine::insert(&mut grid, axis, pos, count, shift_absolute)?;
        } else {
            gridshift_engine::delete(&mut grid, axis, pos, count, shift_absolute)?;
        }
        self.persist(&grid)?;

        let verb = if inserting { "Inserted" } else { "Deleted" };
        info!(
            "{} {} {}(s) at {} on {}",
            verb.to_lowercase(),
            count,
            axis,
            pos,
            sheet
        );
        Ok(format!(
            "{} {} {}(s) at position {} on {}",
            verb, count, axis, pos, sheet
        ))
    }

    /// Delete a rectangle and close the gap by shifting trailing cells up
    /// or left. Contents move verbatim; formulas are not rewritten.
    pub fn delete_range(
        &self,
        sheet: &str,
        range: &str,
        direction: ShiftDirection,
    ) -> OpResult<String> {
        let range = CellRange::parse(range)?;
        let mut grid = self.load(sheet)?;
        gridshift_engine::delete_range(&mut grid, &range, direction)?;
        self.persist(&grid)?;

        info!("deleted range {}!{}", sheet, range);
        Ok(format!("Deleted range {} on {}", range, sheet))
    }

    /// Copy a range to an anchor cell, on the same sheet or onto
    /// `dst_sheet`. Formula references translate by the copy offset.
    pub fn copy_range(
        &self,
        sheet: &str,
        src: &str,
        dst_anchor: &str,
        dst_sheet: Option<&str>,
    ) -> OpResult<String> {
        let src_range = CellRange::parse(src)?;
        let anchor = CellAddress::parse(dst_anchor)?;

        let written = match dst_sheet.filter(|d| !d.eq_ignore_ascii_case(sheet)) {
            None => {
                let mut grid = self.load(sheet)?;
                let written = copy_within(&mut grid, &src_range, anchor)?;
                self.persist(&grid)?;
                written
            }
            Some(dst_sheet) => {
                let src_grid = self.load(sheet)?;
                let mut dst_grid = self.load(dst_sheet)?;
                let written = copy_between(&src_grid, &mut dst_grid, &src_range, anchor)?;
                self.persist(&dst_grid)?;
                written
            }
        };

        let dst_name = dst_sheet.unwrap_or(sheet);
        info!("copied {}!{} to {}!{}", sheet, src_range, dst_name, written);
        Ok(format!(
            "Copied {} on {} to {} on {}",
            src_range, sheet, written, dst_name
        ))
    }

    /// Merge a range of at least two cells. Overlap with an existing merged
    /// region is rejected.
    pub fn merge_cells(&self, sheet: &str, range: &str) -> OpResult<String> {
        let range = CellRange::parse(range)?;
        let mut grid = self.load(sheet)?;
        grid.merges_mut().register(range)?;
        self.persist(&grid)?;

        info!("merged {}!{}", sheet, range);
        Ok(format!("Merged {} on {}", range, sheet))
    }

    /// Remove the merged region exactly matching `range`.
    pub fn unmerge_cells(&self, sheet: &str, range: &str) -> OpResult<String> {
        let range = CellRange::parse(range)?;
        let mut grid = self.load(sheet)?;
        grid.merges_mut().unregister(&range)?;
        self.persist(&grid)?;

        info!("unmerged {}!{}", sheet, range);
        Ok(format!("Unmerged {} on {}", range, sheet))
    }

    /// Merged regions on a sheet, in A1 form.
    pub fn list_merges(&self, sheet: &str) -> OpResult<Vec<String>> {
        let grid = self.load(sheet)?;
        Ok(grid
            .merges()
            .regions()
            .iter()
            .map(|r| r.to_a1_string())
            .collect())
    }

    /// Attach a validation rule to its range on a sheet.
    pub fn add_validation(&self, sheet: &str, rule: ValidationRule) -> OpResult<String> {
        let mut grid = self.load(sheet)?;
        let range = rule.range;
        grid.validations_mut().add(rule);
        self.persist(&grid)?;

        info!("added validation on {}!{}", sheet, range);
        Ok(format!("Added validation rule on {} on {}", range, sheet))
    }

    /// All validation rules on a sheet, in insertion order.
    pub fn list_validations(&self, sheet: &str) -> OpResult<Vec<ValidationRule>> {
        let grid = self.load(sheet)?;
        Ok(grid.validations().rules().to_vec())
    }

    /// Sheet names in workbook order.
    pub fn list_sheets(&self) -> OpResult<Vec<String>> {
        Ok(self.store.list_sheets()?)
    }

    /// Create a new empty sheet.
    pub fn create_sheet(&self, name: &str) -> OpResult<String> {
        self.store.create_sheet(name)?;
        info!("created sheet {:?}", name);
        Ok(format!("Created sheet {:?}", name))
    }

    /// Duplicate a sheet under a new name, contents, merges, and
    /// validations included.
    pub fn copy_sheet(&self, src: &str, dst: &str) -> OpResult<String> {
        let mut grid = self.load(src)?;
        self.store.create_sheet(dst)?;
        grid.set_name(dst);
        self.persist(&grid)?;

        info!("copied sheet {:?} to {:?}", src, dst);
        Ok(format!("Copied sheet {:?} to {:?}", src, dst))
    }

    /// Remove a sheet and everything on it.
    pub fn delete_sheet(&self, name: &str) -> OpResult<String> {
        self.store.delete_sheet(name)?;
        info!("deleted sheet {:?}", name);
        Ok(format!("Deleted sheet {:?}", name))
    }

    /// Rename a sheet. Formulas on other sheets that qualify references
    /// with the old name are left as written.
    pub fn rename_sheet(&self, name: &str, new_name: &str) -> OpResult<String> {
        self.store.rename_sheet(name, new_name)?;
        info!("renamed sheet {:?} to {:?}", name, new_name);
        Ok(format!("Renamed sheet {:?} to {:?}", name, new_name))
    }
}

/// Trim and `=`-prefix formula text.
fn normalize_formula(formula: &str) -> String {
    let trimmed = formula.trim();
    if trimmed.starts_with('=') {
        trimmed.to_string()
    } else {
        format!("={}", trimmed)
    }
}
