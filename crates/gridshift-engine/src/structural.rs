//! Structural mutations: row/column insertion and deletion
//!
//! Each operation validates its inputs, then works on a scratch clone of the
//! grid; the clone replaces the original only when every step succeeds, so a
//! failed operation leaves the sheet untouched. Cell contents, merged
//! regions, validation ranges, and formula references all move through the
//! same [`ShiftOp`] arithmetic.
//!
//! Formulas that end up referring to deleted cells are not an error: they
//! become [`CellValue::BrokenFormula`] and the operation still succeeds,
//! matching how a spreadsheet shows `#REF!` rather than refusing the delete.

use gridshift_core::error::{Error, Result};
use gridshift_core::{
    Axis, CellAddress, CellRange, CellValue, SheetGrid, ShiftOp, MAX_COLUMNS, MAX_ROWS,
};
use log::debug;

use crate::rewriter::{rewrite_formula, RewriteOutcome, RewritePolicy};

/// Where the surviving cells move after a rectangular deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Cells below the rectangle move up into it
    Up,
    /// Cells right of the rectangle move left into it
    Left,
}

fn axis_max(axis: Axis) -> u32 {
    match axis {
        Axis::Row => MAX_ROWS,
        Axis::Column => MAX_COLUMNS,
    }
}

fn out_of_bounds(axis: Axis, coord: i64) -> Error {
    match axis {
        Axis::Row => Error::RowOutOfBounds(coord, MAX_ROWS),
        Axis::Column => Error::ColumnOutOfBounds(coord, MAX_COLUMNS),
    }
}

/// Insert `count` rows or columns before position `at`.
pub fn insert(grid: &mut SheetGrid, axis: Axis, at: u32, count: u32, shift_absolute: bool) -> Result<()> {
    let op = ShiftOp::Insert { axis, at, count };
    apply_shift(grid, &op, shift_absolute)
}

/// Delete the band of `count` rows or columns starting at `start`.
pub fn delete(
    grid: &mut SheetGrid,
    axis: Axis,
    start: u32,
    count: u32,
    shift_absolute: bool,
) -> Result<()> {
    let op = ShiftOp::Delete { axis, start, count };
    apply_shift(grid, &op, shift_absolute)
}

/// Apply a whole-row/column shift to every entity on the sheet.
pub fn apply_shift(grid: &mut SheetGrid, op: &ShiftOp, shift_absolute: bool) -> Result<()> {
    validate_op(grid, op)?;
    debug!("applying {:?} to sheet {:?}", op, grid.name());

    let mut scratch = grid.clone();
    shift_cells(&mut scratch, op);
    rewrite_formulas(&mut scratch, op, shift_absolute);
    scratch.merges_mut().apply_shift(op);
    scratch.validations_mut().apply_shift(op);

    *grid = scratch;
    Ok(())
}

/// Delete a rectangle of cells and close the gap.
///
/// The rectangle's contents are removed along with merged regions lying
/// wholly inside it. Cells beyond the rectangle (below for [`ShiftDirection::Up`],
/// to the right for [`ShiftDirection::Left`]) move into the gap within the
/// rectangle's own columns or rows; their contents, formula text included,
/// move verbatim. Cells outside those columns/rows are unaffected.
pub fn delete_range(
    grid: &mut SheetGrid,
    range: &CellRange,
    direction: ShiftDirection,
) -> Result<()> {
    debug!(
        "deleting range {} on sheet {:?}, shifting {:?}",
        range,
        grid.name(),
        direction
    );

    let mut scratch = grid.clone();
    for addr in range.iter() {
        scratch.clear(&addr);
    }
    scratch.merges_mut().remove_contained(range);

    // Move trailing cells into the gap, nearest first so each target slot
    // is already vacant when written.
    let (delta, in_band, shift): (u32, fn(&CellAddress, &CellRange) -> bool, Axis) = match direction
    {
        ShiftDirection::Up => (range.height(), |a, r| {
            a.column >= r.start.column && a.column <= r.end.column && a.row > r.end.row
        }, Axis::Row),
        ShiftDirection::Left => (range.width(), |a, r| {
            a.row >= r.start.row && a.row <= r.end.row && a.column > r.end.column
        }, Axis::Column),
    };

    let mut movers: Vec<CellAddress> = scratch
        .addresses()
        .into_iter()
        .filter(|a| in_band(a, range))
        .collect();
    movers.sort_by_key(|a| shift.coord_of(a));

    for from in movers {
        let to = shift.with_coord(&from, shift.coord_of(&from) - delta);
        if let Some(value) = scratch.clear(&from) {
            scratch.set_value(to, value);
        }
    }

    *grid = scratch;
    Ok(())
}

fn validate_op(grid: &SheetGrid, op: &ShiftOp) -> Result<()> {
    let axis = op.axis();
    let max = axis_max(axis);

    match *op {
        ShiftOp::Insert { at, count, .. } => {
            if at == 0 || at > max {
                return Err(Error::InvalidPosition(at));
            }
            if count == 0 {
                return Err(Error::InvalidCount(count));
            }
            // The inserted band itself must fit the sheet
            let band_end = at as i64 + count as i64 - 1;
            if band_end > max as i64 {
                return Err(out_of_bounds(axis, band_end));
            }
            // Refuse to push any cell, merge, or validation past the edge
            if let Some(last) = shifted_extent(grid, axis) {
                if last >= at && last as i64 + count as i64 > max as i64 {
                    return Err(out_of_bounds(axis, last as i64 + count as i64));
                }
            }
        }
        ShiftOp::Delete { start, count, .. } => {
            if start == 0 || start > max {
                return Err(Error::InvalidPosition(start));
            }
            if count == 0 {
                return Err(Error::InvalidCount(count));
            }
            let band_end = start as i64 + count as i64 - 1;
            if band_end > max as i64 {
                return Err(out_of_bounds(axis, band_end));
            }
        }
    }
    Ok(())
}

/// Farthest coordinate along `axis` of anything a shift would move: set
/// cells, merged regions, and validation ranges.
fn shifted_extent(grid: &SheetGrid, axis: Axis) -> Option<u32> {
    let cells = grid.used_range().map(|u| axis.coord_of(&u.end));
    let merges = grid
        .merges()
        .regions()
        .iter()
        .map(|r| axis.coord_of(&r.end))
        .max();
    let validations = grid
        .validations()
        .rules()
        .iter()
        .map(|r| axis.coord_of(&r.range.end))
        .max();
    [cells, merges, validations].into_iter().flatten().max()
}

/// Move cell contents per the shift, removing cells in a deleted band.
fn shift_cells(grid: &mut SheetGrid, op: &ShiftOp) {
    let axis = op.axis();
    let mut moves: Vec<(CellAddress, CellAddress)> = Vec::new();

    for addr in grid.addresses() {
        match op.apply_to_address(&addr) {
            None => {
                grid.clear(&addr);
            }
            Some(moved) if moved != addr => moves.push((addr, moved)),
            Some(_) => {}
        }
    }

    // Insertion moves cells toward higher coordinates: walk farthest-first
    // so a move never overwrites a cell still waiting to move. Deletion
    // moves the other way, so walk nearest-first.
    match op {
        ShiftOp::Insert { .. } => moves.sort_by_key(|(from, _)| std::cmp::Reverse(axis.coord_of(from))),
        ShiftOp::Delete { .. } => moves.sort_by_key(|(from, _)| axis.coord_of(from)),
    }

    for (from, to) in moves {
        if let Some(value) = grid.clear(&from) {
            grid.set_value(to, value);
        }
    }
}

/// Rewrite every live formula on the sheet for the shift. Formulas whose
/// references fell into a deleted band become broken cells.
fn rewrite_formulas(grid: &mut SheetGrid, op: &ShiftOp, shift_absolute: bool) {
    let sheet = grid.name().to_string();
    let policy = RewritePolicy::StructuralShift {
        op,
        sheet: &sheet,
        shift_absolute,
    };

    let formulas: Vec<(CellAddress, String)> = grid
        .formula_cells()
        .map(|(addr, text)| (addr, text.to_string()))
        .collect();

    for (addr, text) in formulas {
        match rewrite_formula(&text, &policy) {
            RewriteOutcome::Unchanged => {}
            RewriteOutcome::Rewritten(new_text) => grid.set_formula(addr, &new_text),
            RewriteOutcome::Broken { reason } => {
                debug!("formula at {} broke: {}", addr, reason);
                grid.set_value(
                    addr,
                    CellValue::BrokenFormula {
                        original: text,
                        reason,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridshift_core::{ValidationRule, ValidationOperator};
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn range(s: &str) -> CellRange {
        CellRange::parse(s).unwrap()
    }

    fn text_of(grid: &SheetGrid, s: &str) -> String {
        grid.value(&addr(s)).map(|v| v.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_insert_rows_moves_cells_and_formulas() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        grid.set_value(addr("A5"), 2.0);
        grid.set_formula(addr("B1"), "=A5*2");

        insert(&mut grid, Axis::Row, 3, 2, true).unwrap();

        assert_eq!(grid.value(&addr("A1")), Some(&CellValue::Number(1.0)));
        assert!(grid.value(&addr("A5")).is_none());
        assert_eq!(grid.value(&addr("A7")), Some(&CellValue::Number(2.0)));
        assert_eq!(text_of(&grid, "B1"), "=A7*2");
    }

    #[test]
    fn test_insert_columns_shifts_merges_and_validations() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.merges_mut().register(range("B1:C2")).unwrap();
        grid.validations_mut()
            .add(ValidationRule::whole_number(
                range("B5:B9"),
                ValidationOperator::GreaterThan,
                "0",
            ));

        insert(&mut grid, Axis::Column, 2, 1, true).unwrap();

        assert_eq!(grid.merges().regions(), [range("C1:D2")]);
        assert_eq!(grid.validations().rules()[0].range, range("C5:C9"));
    }

    #[test]
    fn test_delete_rows_breaks_dependent_formula() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("B3"), 10.0);
        grid.set_formula(addr("B5"), "=B3*2");
        grid.set_formula(addr("B6"), "=B1+1");

        delete(&mut grid, Axis::Row, 2, 2, true).unwrap();

        // B5's formula referenced the deleted B3; B5 itself moved to B3.
        let moved = grid.value(&addr("B3")).unwrap();
        assert!(moved.is_broken());
        assert_eq!(moved.to_string(), "#REF!");
        // B6 moved to B4, its reference to B1 untouched
        assert_eq!(text_of(&grid, "B4"), "=B1+1");
    }

    #[test]
    fn test_delete_clips_range_formula() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_formula(addr("C1"), "=SUM(A1:A10)");

        delete(&mut grid, Axis::Row, 2, 3, true).unwrap();

        assert_eq!(text_of(&grid, "C1"), "=SUM(A1:A7)");
    }

    #[test]
    fn test_insert_then_delete_roundtrip() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        grid.set_value(addr("C4"), "x");
        grid.set_formula(addr("D2"), "=A1+$C$4");
        grid.merges_mut().register(range("B6:C7")).unwrap();
        let before = grid.clone();

        insert(&mut grid, Axis::Row, 3, 4, true).unwrap();
        delete(&mut grid, Axis::Row, 3, 4, true).unwrap();

        assert_eq!(grid, before);
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        let before = grid.clone();

        assert!(matches!(
            insert(&mut grid, Axis::Row, 0, 1, true),
            Err(Error::InvalidPosition(0))
        ));
        assert!(matches!(
            insert(&mut grid, Axis::Row, 1, 0, true),
            Err(Error::InvalidCount(0))
        ));
        assert!(matches!(
            delete(&mut grid, Axis::Column, MAX_COLUMNS, 2, true),
            Err(Error::ColumnOutOfBounds(..))
        ));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_insert_refuses_to_push_cells_off_sheet() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(CellAddress::new(1, MAX_ROWS), 1.0);
        let before = grid.clone();

        assert!(matches!(
            insert(&mut grid, Axis::Row, 1, 1, true),
            Err(Error::RowOutOfBounds(..))
        ));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_insert_refuses_to_push_merge_off_sheet() {
        // No cells set; the merge alone sits at the sheet edge
        let mut grid = SheetGrid::new("Sheet1");
        grid.merges_mut()
            .register(CellRange::new(
                CellAddress::new(1, MAX_ROWS - 1),
                CellAddress::new(2, MAX_ROWS),
            ))
            .unwrap();
        let before = grid.clone();

        assert!(matches!(
            insert(&mut grid, Axis::Row, 1, 1, true),
            Err(Error::RowOutOfBounds(..))
        ));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_insert_refuses_to_push_validation_off_sheet() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.validations_mut().add(ValidationRule::whole_number(
            CellRange::single(CellAddress::new(MAX_COLUMNS, 1)),
            ValidationOperator::GreaterThan,
            "0",
        ));

        assert!(matches!(
            insert(&mut grid, Axis::Column, 1, 1, true),
            Err(Error::ColumnOutOfBounds(..))
        ));
    }

    #[test]
    fn test_insert_band_must_fit_sheet() {
        // Empty sheet: nothing to move, but the band itself cannot fit
        let mut grid = SheetGrid::new("Sheet1");
        assert!(matches!(
            insert(&mut grid, Axis::Row, 2, MAX_ROWS, true),
            Err(Error::RowOutOfBounds(..))
        ));
    }

    #[test]
    fn test_delete_drops_contained_merge_keeps_clipped() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.merges_mut().register(range("A2:B3")).unwrap();
        grid.merges_mut().register(range("D1:D5")).unwrap();

        delete(&mut grid, Axis::Row, 2, 2, true).unwrap();

        assert_eq!(grid.merges().regions(), [range("D1:D3")]);
    }

    #[test]
    fn test_delete_range_shift_up() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("B2"), "gone");
        grid.set_value(addr("B4"), 4.0);
        grid.set_value(addr("B6"), 6.0);
        grid.set_value(addr("C4"), "stays"); // outside the range's columns

        delete_range(&mut grid, &range("B2:B3"), ShiftDirection::Up).unwrap();

        assert_eq!(grid.value(&addr("B2")), Some(&CellValue::Number(4.0)));
        assert_eq!(grid.value(&addr("B4")), Some(&CellValue::Number(6.0)));
        assert!(grid.value(&addr("B6")).is_none());
        assert_eq!(text_of(&grid, "C4"), "stays");
    }

    #[test]
    fn test_delete_range_shift_left_keeps_formula_text() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        grid.set_formula(addr("D1"), "=A1*3");

        delete_range(&mut grid, &range("B1:C1"), ShiftDirection::Left).unwrap();

        // Rectangular deletion moves contents verbatim
        assert_eq!(text_of(&grid, "B1"), "=A1*3");
        assert!(grid.value(&addr("D1")).is_none());
    }

    #[test]
    fn test_delete_range_drops_contained_merge() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.merges_mut().register(range("B2:C3")).unwrap();
        grid.merges_mut().register(range("E1:F1")).unwrap();

        delete_range(&mut grid, &range("A1:D4"), ShiftDirection::Up).unwrap();

        assert_eq!(grid.merges().regions(), [range("E1:F1")]);
    }
}
