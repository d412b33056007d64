//! End-to-end operation tests against a JSON workbook on disk

use gridshift::{
    CellAddress, CellValue, EngineConfig, JsonWorkbookStore, SheetOps, ShiftDirection,
    ValidationRule, WorkbookStore,
};
use pretty_assertions::assert_eq;

fn workbook(dir: &tempfile::TempDir) -> SheetOps<JsonWorkbookStore> {
    let store = JsonWorkbookStore::new(dir.path().join("book.json"));
    store.create_sheet("Sheet1").unwrap();
    SheetOps::new(store)
}

fn formula_at(ops: &SheetOps<JsonWorkbookStore>, sheet: &str, cell: &str) -> Option<String> {
    let grid = ops.store().load(sheet).unwrap();
    let addr = CellAddress::parse(cell).unwrap();
    grid.value(&addr)
        .and_then(|v| v.formula_text().map(str::to_string))
}

#[test]
fn insert_rows_keeps_formulas_merges_and_validations_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.apply_formula("Sheet1", "B1", "=A5+$A$6").unwrap();
    ops.merge_cells("Sheet1", "A5:B6").unwrap();
    ops.add_validation(
        "Sheet1",
        ValidationRule::list(gridshift::CellRange::parse("A5:A9").unwrap(), "Yes,No"),
    )
    .unwrap();

    ops.insert_rows("Sheet1", 3, 2).unwrap();

    // Formula cell stayed at B1 (above the insertion) but its references moved
    assert_eq!(formula_at(&ops, "Sheet1", "B1").as_deref(), Some("=A7+$A$8"));
    assert_eq!(ops.list_merges("Sheet1").unwrap(), ["A7:B8"]);
    let rules = ops.list_validations("Sheet1").unwrap();
    assert_eq!(rules[0].range.to_a1_string(), "A7:A11");
}

#[test]
fn delete_rows_breaks_dependent_formulas_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.apply_formula("Sheet1", "B5", "=B3*2").unwrap();
    ops.apply_formula("Sheet1", "B6", "=SUM(A1:A10)").unwrap();

    ops.delete_rows("Sheet1", 2, 2).unwrap();

    // B5 moved to B3; its reference into the deleted band broke it
    let grid = ops.store().load("Sheet1").unwrap();
    let b3 = grid.value(&CellAddress::parse("B3").unwrap()).unwrap();
    assert!(b3.is_broken());
    assert_eq!(b3.to_string(), "#REF!");
    // B6 moved to B4 with its range clipped
    assert_eq!(
        formula_at(&ops, "Sheet1", "B4").as_deref(),
        Some("=SUM(A1:A8)")
    );
}

#[test]
fn keep_absolute_config_pins_anchored_references() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonWorkbookStore::new(dir.path().join("book.json"));
    store.create_sheet("Sheet1").unwrap();
    let ops = SheetOps::with_config(
        store,
        EngineConfig {
            shift_absolute_refs: false,
            ..Default::default()
        },
    );

    ops.apply_formula("Sheet1", "E1", "=A1+$B$1").unwrap();
    ops.insert_columns("Sheet1", 1, 1).unwrap();

    assert_eq!(formula_at(&ops, "Sheet1", "F1").as_deref(), Some("=B1+$B$1"));
}

#[test]
fn copy_range_translates_within_and_across_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);
    ops.create_sheet("Report").unwrap();

    ops.apply_formula("Sheet1", "B1", "=A1").unwrap();

    ops.copy_range("Sheet1", "B1:B1", "D1", None).unwrap();
    assert_eq!(formula_at(&ops, "Sheet1", "D1").as_deref(), Some("=C1"));

    ops.copy_range("Sheet1", "B1:B1", "B5", Some("Report")).unwrap();
    assert_eq!(formula_at(&ops, "Report", "B5").as_deref(), Some("=A5"));
    // Source sheet untouched by the cross-sheet copy
    assert_eq!(formula_at(&ops, "Sheet1", "B1").as_deref(), Some("=A1"));
}

#[test]
fn delete_range_shifts_up_without_rewriting() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.apply_formula("Sheet1", "B4", "=A1*3").unwrap();
    ops.apply_formula("Sheet1", "B2", "=0").unwrap();

    ops.delete_range("Sheet1", "B2:B3", ShiftDirection::Up)
        .unwrap();

    assert_eq!(formula_at(&ops, "Sheet1", "B2").as_deref(), Some("=A1*3"));
    assert!(formula_at(&ops, "Sheet1", "B4").is_none());
}

#[test]
fn merge_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.merge_cells("Sheet1", "A1:B2").unwrap();
    // Overlap rejected, registry unchanged
    let err = ops.merge_cells("Sheet1", "B2:C3").unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(ops.list_merges("Sheet1").unwrap(), ["A1:B2"]);

    // Unmerge then remerge the previously conflicting range
    ops.unmerge_cells("Sheet1", "A1:B2").unwrap();
    ops.merge_cells("Sheet1", "B2:C3").unwrap();
    assert_eq!(ops.list_merges("Sheet1").unwrap(), ["B2:C3"]);
}

#[test]
fn failed_operation_leaves_workbook_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);
    ops.apply_formula("Sheet1", "A1", "=1+1").unwrap();
    let before = ops.store().load("Sheet1").unwrap();

    assert!(ops.insert_rows("Sheet1", 0, 1).is_err());
    assert!(ops.delete_columns("Sheet1", 1, 0).is_err());
    assert!(ops.merge_cells("Sheet1", "A1").is_err());

    assert_eq!(ops.store().load("Sheet1").unwrap(), before);
}

#[test]
fn read_range_reports_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.apply_formula("Sheet1", "A2", "=B2*2").unwrap();
    ops.merge_cells("Sheet1", "A1:B1").unwrap();
    ops.add_validation(
        "Sheet1",
        ValidationRule::list(gridshift::CellRange::parse("A2:A5").unwrap(), "1,2,3"),
    )
    .unwrap();

    let readout = ops.read_range("Sheet1", "A1", Some("B5")).unwrap();
    assert_eq!(readout.sheet, "Sheet1");
    assert_eq!(readout.cells.len(), 1);
    let cell = &readout.cells[0];
    assert_eq!(cell.address, "A2");
    assert_eq!(cell.formula.as_deref(), Some("=B2*2"));
    assert_eq!(cell.validation.as_ref().unwrap().kind, "list");
}

#[test]
fn scientific_constants_survive_structural_shift() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    // The exponent of 1E5 must not be treated as a reference to E5
    ops.apply_formula("Sheet1", "B1", "=1E5+A1").unwrap();
    ops.insert_rows("Sheet1", 1, 1).unwrap();
    assert_eq!(formula_at(&ops, "Sheet1", "B2").as_deref(), Some("=1E5+A2"));

    ops.apply_formula("Sheet1", "C1", "=1.5E2*2e10").unwrap();
    ops.insert_columns("Sheet1", 1, 3).unwrap();
    assert_eq!(
        formula_at(&ops, "Sheet1", "F1").as_deref(),
        Some("=1.5E2*2e10")
    );
}

#[test]
fn write_values_and_sheet_management() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.write_values(
        "Sheet1",
        "A1",
        &[
            vec![
                Some(CellValue::Number(10.0)),
                Some(CellValue::Text("label".into())),
            ],
            vec![Some(CellValue::Text("=A1*2".into())), None],
        ],
    )
    .unwrap();

    assert_eq!(formula_at(&ops, "Sheet1", "A2").as_deref(), Some("=A1*2"));

    ops.copy_sheet("Sheet1", "Backup").unwrap();
    ops.rename_sheet("Backup", "Archive").unwrap();
    assert_eq!(ops.list_sheets().unwrap(), ["Sheet1", "Archive"]);
    assert_eq!(formula_at(&ops, "Archive", "A2").as_deref(), Some("=A1*2"));

    ops.delete_sheet("Sheet1").unwrap();
    assert_eq!(ops.list_sheets().unwrap(), ["Archive"]);
    assert!(ops.read_range("Sheet1", "A1", None).unwrap_err().is_user_error());
}

#[test]
fn insert_then_delete_is_identity_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ops = workbook(&dir);

    ops.apply_formula("Sheet1", "C2", "=A1+$B$7").unwrap();
    ops.merge_cells("Sheet1", "D5:E6").unwrap();
    let before = ops.store().load("Sheet1").unwrap();

    ops.insert_rows("Sheet1", 4, 3).unwrap();
    ops.delete_rows("Sheet1", 4, 3).unwrap();

    assert_eq!(ops.store().load("Sheet1").unwrap(), before);
}
