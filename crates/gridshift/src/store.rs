//! Workbook persistence
//!
//! The engine mutates one [`SheetGrid`] at a time; a [`WorkbookStore`] is
//! where grids come from and go back to. The bundled implementation keeps a
//! whole workbook in a single JSON document and saves atomically, so a crash
//! mid-save never leaves a half-written workbook behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use gridshift_core::SheetGrid;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence failures, split by whose fault they are
#[derive(Debug, Error)]
pub enum StoreError {
    /// Named sheet does not exist in the workbook
    #[error("Sheet {0:?} not found")]
    SheetNotFound(String),

    /// Sheet creation with a name already in use
    #[error("Sheet {0:?} already exists")]
    SheetExists(String),

    /// Workbook file exists but cannot be understood
    #[error("Workbook {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where worksheets are loaded from and saved to.
///
/// Callers serialize per workbook: the engine never holds more than one
/// load/save cycle open at a time, and concurrent processes writing the same
/// workbook are outside the store's contract.
pub trait WorkbookStore {
    /// Load one sheet by name (case-insensitive, spreadsheet convention).
    fn load(&self, sheet: &str) -> Result<SheetGrid, StoreError>;

    /// Persist a sheet, replacing the stored one of the same name.
    fn save(&self, grid: &SheetGrid) -> Result<(), StoreError>;

    /// Names of all sheets, in workbook order.
    fn list_sheets(&self) -> Result<Vec<String>, StoreError>;

    /// Create a new empty sheet.
    fn create_sheet(&self, name: &str) -> Result<(), StoreError>;

    /// Remove a sheet and its contents.
    fn delete_sheet(&self, name: &str) -> Result<(), StoreError>;

    /// Rename a sheet, keeping its position in workbook order.
    fn rename_sheet(&self, name: &str, new_name: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkbookDoc {
    sheets: Vec<SheetGrid>,
}

/// JSON-file workbook store
///
/// A missing file reads as an empty workbook; the first save creates it.
#[derive(Debug, Clone)]
pub struct JsonWorkbookStore {
    path: PathBuf,
}

impl JsonWorkbookStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_doc(&self) -> Result<WorkbookDoc, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WorkbookDoc::default())
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn write_doc(&self, doc: &WorkbookDoc) -> Result<(), StoreError> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        serde_json::to_writer_pretty(&mut tmp, doc).map_err(std::io::Error::from)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("wrote workbook {}", self.path.display());
        Ok(())
    }
}

impl WorkbookStore for JsonWorkbookStore {
    fn load(&self, sheet: &str) -> Result<SheetGrid, StoreError> {
        let doc = self.read_doc()?;
        doc.sheets
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(sheet))
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
    }

    fn save(&self, grid: &SheetGrid) -> Result<(), StoreError> {
        let mut doc = self.read_doc()?;
        match doc
            .sheets
            .iter_mut()
            .find(|g| g.name().eq_ignore_ascii_case(grid.name()))
        {
            Some(slot) => *slot = grid.clone(),
            None => doc.sheets.push(grid.clone()),
        }
        self.write_doc(&doc)
    }

    fn list_sheets(&self) -> Result<Vec<String>, StoreError> {
        let doc = self.read_doc()?;
        Ok(doc.sheets.iter().map(|g| g.name().to_string()).collect())
    }

    fn create_sheet(&self, name: &str) -> Result<(), StoreError> {
        let mut doc = self.read_doc()?;
        if doc
            .sheets
            .iter()
            .any(|g| g.name().eq_ignore_ascii_case(name))
        {
            return Err(StoreError::SheetExists(name.to_string()));
        }
        doc.sheets.push(SheetGrid::new(name));
        self.write_doc(&doc)
    }

    fn delete_sheet(&self, name: &str) -> Result<(), StoreError> {
        let mut doc = self.read_doc()?;
        let idx = doc
            .sheets
            .iter()
            .position(|g| g.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| StoreError::SheetNotFound(name.to_string()))?;
        doc.sheets.remove(idx);
        self.write_doc(&doc)
    }

    fn rename_sheet(&self, name: &str, new_name: &str) -> Result<(), StoreError> {
        let mut doc = self.read_doc()?;
        let idx = doc
            .sheets
            .iter()
            .position(|g| g.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| StoreError::SheetNotFound(name.to_string()))?;
        // The new name may only collide with the sheet being renamed
        if doc
            .sheets
            .iter()
            .enumerate()
            .any(|(i, g)| i != idx && g.name().eq_ignore_ascii_case(new_name))
        {
            return Err(StoreError::SheetExists(new_name.to_string()));
        }
        doc.sheets[idx].set_name(new_name);
        self.write_doc(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridshift_core::CellAddress;
    use pretty_assertions::assert_eq;

    fn store_in(dir: &tempfile::TempDir) -> JsonWorkbookStore {
        JsonWorkbookStore::new(dir.path().join("book.json"))
    }

    #[test]
    fn test_missing_file_is_empty_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.list_sheets().unwrap(), Vec::<String>::new());
        assert!(matches!(
            store.load("Sheet1"),
            Err(StoreError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut grid = SheetGrid::new("Data");
        grid.set_value(CellAddress::parse("A1").unwrap(), 42.0);
        grid.set_formula(CellAddress::parse("B1").unwrap(), "=A1*2");
        store.save(&grid).unwrap();

        let loaded = store.load("Data").unwrap();
        assert_eq!(loaded, grid);
        // Sheet lookup is case-insensitive
        assert_eq!(store.load("data").unwrap(), grid);
    }

    #[test]
    fn test_save_replaces_existing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.create_sheet("Data").unwrap();
        store.create_sheet("Report").unwrap();

        let mut grid = SheetGrid::new("Data");
        grid.set_value(CellAddress::parse("A1").unwrap(), 1.0);
        store.save(&grid).unwrap();

        assert_eq!(store.list_sheets().unwrap(), ["Data", "Report"]);
        assert_eq!(store.load("Data").unwrap().cell_count(), 1);
    }

    #[test]
    fn test_create_sheet_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create_sheet("Data").unwrap();
        assert!(matches!(
            store.create_sheet("DATA"),
            Err(StoreError::SheetExists(_))
        ));
    }

    #[test]
    fn test_delete_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create_sheet("Data").unwrap();
        store.create_sheet("Report").unwrap();

        store.delete_sheet("data").unwrap();
        assert_eq!(store.list_sheets().unwrap(), ["Report"]);
        assert!(matches!(
            store.delete_sheet("Data"),
            Err(StoreError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_rename_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create_sheet("Data").unwrap();
        store.create_sheet("Report").unwrap();

        let mut grid = SheetGrid::new("Data");
        grid.set_value(CellAddress::parse("A1").unwrap(), 7.0);
        store.save(&grid).unwrap();

        store.rename_sheet("Data", "Archive").unwrap();
        // Position and contents survive the rename
        assert_eq!(store.list_sheets().unwrap(), ["Archive", "Report"]);
        assert_eq!(store.load("Archive").unwrap().cell_count(), 1);

        assert!(matches!(
            store.rename_sheet("Archive", "report"),
            Err(StoreError::SheetExists(_))
        ));
        // Case-only rename of the same sheet is allowed
        store.rename_sheet("Archive", "ARCHIVE").unwrap();
        assert_eq!(store.list_sheets().unwrap(), ["ARCHIVE", "Report"]);
    }

    #[test]
    fn test_corrupt_file_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"not json").unwrap();
        assert!(matches!(
            store.list_sheets(),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
