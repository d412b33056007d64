//! Range copy with reference translation
//!
//! Copying a rectangle of cells moves values verbatim and translates
//! formulas by the copy offset: relative reference axes shift by the
//! column/row delta, `$`-anchored axes stay fixed. A translated reference
//! that would land outside the sheet turns the copied formula into a broken
//! cell rather than failing the whole copy.
//!
//! Within one sheet the source is buffered before anything is written, so a
//! destination overlapping its own source reads consistent data.

use gridshift_core::error::Result;
use gridshift_core::{CellAddress, CellRange, CellValue, SheetGrid};
use log::debug;

use crate::rewriter::{rewrite_formula, RewriteOutcome, RewritePolicy};

/// Copy `src` to the rectangle anchored at `dst_anchor` on the same sheet.
///
/// Returns the destination range actually written.
pub fn copy_within(
    grid: &mut SheetGrid,
    src: &CellRange,
    dst_anchor: CellAddress,
) -> Result<CellRange> {
    let (col_delta, row_delta, dst) = destination(src, dst_anchor)?;
    debug!("copying {} to {} on sheet {:?}", src, dst, grid.name());

    let buffer = snapshot(grid, src);
    let sheet = grid.name().to_string();
    write_buffer(grid, buffer, &dst, col_delta, row_delta, &sheet);
    Ok(dst)
}

/// Copy `src` from one sheet to the rectangle anchored at `dst_anchor` on
/// another. Sheet-local references in copied formulas are translated against
/// the destination sheet's coordinate space.
pub fn copy_between(
    src_grid: &SheetGrid,
    dst_grid: &mut SheetGrid,
    src: &CellRange,
    dst_anchor: CellAddress,
) -> Result<CellRange> {
    let (col_delta, row_delta, dst) = destination(src, dst_anchor)?;
    debug!(
        "copying {}!{} to {}!{}",
        src_grid.name(),
        src,
        dst_grid.name(),
        dst
    );

    let buffer = snapshot(src_grid, src);
    let sheet = dst_grid.name().to_string();
    write_buffer(dst_grid, buffer, &dst, col_delta, row_delta, &sheet);
    Ok(dst)
}

/// Compute the copy deltas and bounds-check the destination rectangle.
fn destination(src: &CellRange, dst_anchor: CellAddress) -> Result<(i64, i64, CellRange)> {
    let col_delta = dst_anchor.column as i64 - src.start.column as i64;
    let row_delta = dst_anchor.row as i64 - src.start.row as i64;
    // Fails when the far corner would fall outside the sheet
    let dst_end = src.end.offset(col_delta, row_delta)?;
    Ok((col_delta, row_delta, CellRange::new(dst_anchor, dst_end)))
}

fn snapshot(grid: &SheetGrid, src: &CellRange) -> Vec<(CellAddress, CellValue)> {
    src.iter()
        .filter_map(|a| grid.value(&a).cloned().map(|v| (a, v)))
        .collect()
}

fn write_buffer(
    grid: &mut SheetGrid,
    buffer: Vec<(CellAddress, CellValue)>,
    dst: &CellRange,
    col_delta: i64,
    row_delta: i64,
    sheet: &str,
) {
    for addr in dst.iter() {
        grid.clear(&addr);
    }

    let policy = RewritePolicy::CopyTranslate {
        col_delta,
        row_delta,
        sheet,
    };

    for (src_addr, value) in buffer {
        // Deltas were bounds-checked for the whole rectangle already
        let Ok(target) = src_addr.offset(col_delta, row_delta) else {
            continue;
        };
        let copied = match &value {
            CellValue::Formula(text) => match rewrite_formula(text, &policy) {
                RewriteOutcome::Unchanged => value,
                RewriteOutcome::Rewritten(new_text) => CellValue::Formula(new_text),
                RewriteOutcome::Broken { reason } => {
                    debug!("copied formula from {} broke: {}", src_addr, reason);
                    CellValue::BrokenFormula {
                        original: text.clone(),
                        reason,
                    }
                }
            },
            _ => value,
        };
        grid.set_value(target, copied);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_copy_translates_relative_reference() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_formula(addr("B1"), "=A1");

        let dst = copy_within(&mut grid, &range("B1:B1"), addr("D1")).unwrap();

        assert_eq!(dst, range("D1:D1"));
        assert_eq!(text_of(&grid, "D1"), "=C1");
        // Source untouched
        assert_eq!(text_of(&grid, "B1"), "=A1");
    }

    #[test]
    fn test_copy_keeps_absolute_axes() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_formula(addr("B2"), "=$A$1+A$1+$A1");

        copy_within(&mut grid, &range("B2:B2"), addr("C3")).unwrap();

        assert_eq!(text_of(&grid, "C3"), "=$A$1+B$1+$A2");
    }

    #[test]
    fn test_copy_values_verbatim() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        grid.set_value(addr("A2"), "text");
        grid.set_value(addr("B1"), true);

        let dst = copy_within(&mut grid, &range("A1:B2"), addr("D5")).unwrap();

        assert_eq!(dst, range("D5:E6"));
        assert_eq!(grid.value(&addr("D5")), Some(&CellValue::Number(1.0)));
        assert_eq!(grid.value(&addr("D6")), Some(&CellValue::Text("text".into())));
        assert_eq!(grid.value(&addr("E5")), Some(&CellValue::Bool(true)));
        assert!(grid.value(&addr("E6")).is_none());
    }

    #[test]
    fn test_self_overlapping_copy_is_buffered() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        grid.set_value(addr("A2"), 2.0);
        grid.set_value(addr("A3"), 3.0);

        copy_within(&mut grid, &range("A1:A3"), addr("A2")).unwrap();

        assert_eq!(grid.value(&addr("A1")), Some(&CellValue::Number(1.0)));
        assert_eq!(grid.value(&addr("A2")), Some(&CellValue::Number(1.0)));
        assert_eq!(grid.value(&addr("A3")), Some(&CellValue::Number(2.0)));
        assert_eq!(grid.value(&addr("A4")), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_copy_clears_destination_first() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        grid.set_value(addr("C1"), "old");
        grid.set_value(addr("C2"), "stale");

        copy_within(&mut grid, &range("A1:A2"), addr("C1")).unwrap();

        assert_eq!(grid.value(&addr("C1")), Some(&CellValue::Number(1.0)));
        // A2 was unset, so C2 must end up unset too
        assert!(grid.value(&addr("C2")).is_none());
    }

    #[test]
    fn test_copy_off_sheet_rejected_before_writing() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_value(addr("A1"), 1.0);
        let before = grid.clone();

        let result = copy_within(
            &mut grid,
            &range("A1:B2"),
            CellAddress::new(gridshift_core::MAX_COLUMNS, 1),
        );

        assert!(result.is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_translated_reference_off_sheet_breaks_cell() {
        let mut grid = SheetGrid::new("Sheet1");
        grid.set_formula(addr("B1"), "=A1");

        // Copying one column left would make the reference column zero
        copy_within(&mut grid, &range("B1:B1"), addr("A2")).unwrap();

        assert!(grid.value(&addr("A2")).unwrap().is_broken());
    }

    #[test]
    fn test_copy_between_sheets_translates_against_destination() {
        let src = {
            let mut g = SheetGrid::new("Data");
            g.set_value(addr("A1"), 5.0);
            g.set_formula(addr("B1"), "=A1*2");
            g.set_formula(addr("B2"), "=Data!A1");
            g
        };
        let mut dst = SheetGrid::new("Report");

        let written = copy_between(&src, &mut dst, &range("A1:B2"), addr("C3")).unwrap();

        assert_eq!(written, range("C3:D4"));
        assert_eq!(dst.value(&addr("C3")), Some(&CellValue::Number(5.0)));
        // Unqualified reference translated in the destination's space
        assert_eq!(text_of(&dst, "D3"), "=C3*2");
        // Qualified reference still points at the source sheet, untranslated
        assert_eq!(text_of(&dst, "D4"), "=Data!A1");
    }
}
