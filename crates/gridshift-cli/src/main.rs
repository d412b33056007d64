//! gridshift command-line interface
//!
//! One subcommand per workbook operation, working against a JSON workbook
//! file. Structured output (readouts, listings) prints as JSON; mutations
//! print their confirmation message.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gridshift::{CellValue, EngineConfig, JsonWorkbookStore, SheetOps, ShiftDirection};

#[derive(Parser)]
#[command(name = "gridshift", version, about = "Structural spreadsheet editing")]
struct Cli {
    /// Workbook file (JSON)
    #[arg(short, long, global = true, default_value = "workbook.json")]
    file: PathBuf,

    /// Base directory for relative workbook paths
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    /// Keep $-anchored references pinned during row/column inserts and
    /// deletes instead of shifting them with the cells they name
    #[arg(long, global = true)]
    keep_absolute: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set a formula cell
    ApplyFormula {
        sheet: String,
        cell: String,
        formula: String,
    },
    /// Check a formula and its target cell without writing anything
    ValidateFormula {
        sheet: String,
        cell: String,
        formula: String,
    },
    /// Read a range with cell metadata (omit END to read to the sheet's
    /// populated extent)
    Read {
        sheet: String,
        start: String,
        end: Option<String>,
    },
    /// Insert rows before a position
    InsertRows {
        sheet: String,
        at: u32,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Insert columns before a position
    InsertCols {
        sheet: String,
        at: u32,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Delete rows starting at a position
    DeleteRows {
        sheet: String,
        start: u32,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Delete columns starting at a position
    DeleteCols {
        sheet: String,
        start: u32,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Delete a rectangle of cells and close the gap
    DeleteRange {
        sheet: String,
        range: String,
        #[arg(long, value_enum, default_value_t = Direction::Up)]
        shift: Direction,
    },
    /// Copy a range to an anchor cell, optionally onto another sheet
    CopyRange {
        sheet: String,
        src: String,
        dest: String,
        #[arg(long)]
        to_sheet: Option<String>,
    },
    /// Merge a range of cells
    Merge { sheet: String, range: String },
    /// Remove a merged region
    Unmerge { sheet: String, range: String },
    /// List merged regions on a sheet
    ListMerges { sheet: String },
    /// List validation rules on a sheet
    ListValidations { sheet: String },
    /// List sheet names
    Sheets,
    /// Create a new empty sheet
    NewSheet { name: String },
    /// Write a JSON rectangle of values starting at a cell
    ///
    /// DATA is a JSON array of rows, e.g. '[[1,"x"],["=A1*2",null]]'.
    /// Strings starting with '=' become formulas; null clears the cell.
    Write {
        sheet: String,
        start: String,
        data: String,
    },
    /// Duplicate a sheet under a new name
    CopySheet { src: String, dst: String },
    /// Remove a sheet and its contents
    DeleteSheet { name: String },
    /// Rename a sheet
    RenameSheet { name: String, new_name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Left,
}

impl From<Direction> for ShiftDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => ShiftDirection::Up,
            Direction::Left => ShiftDirection::Left,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = EngineConfig {
        workdir: cli.workdir.clone(),
        shift_absolute_refs: !cli.keep_absolute,
    };
    let store = JsonWorkbookStore::new(config.resolve(&cli.file));
    let ops = SheetOps::with_config(store, config);

    match cli.command {
        Command::ApplyFormula {
            sheet,
            cell,
            formula,
        } => println!("{}", ops.apply_formula(&sheet, &cell, &formula)?),
        Command::ValidateFormula {
            sheet,
            cell,
            formula,
        } => println!("{}", ops.validate_formula(&sheet, &cell, &formula)?),
        Command::Read { sheet, start, end } => {
            let readout = ops.read_range(&sheet, &start, end.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&readout)?);
        }
        Command::InsertRows { sheet, at, count } => {
            println!("{}", ops.insert_rows(&sheet, at, count)?)
        }
        Command::InsertCols { sheet, at, count } => {
            println!("{}", ops.insert_columns(&sheet, at, count)?)
        }
        Command::DeleteRows { sheet, start, count } => {
            println!("{}", ops.delete_rows(&sheet, start, count)?)
        }
        Command::DeleteCols { sheet, start, count } => {
            println!("{}", ops.delete_columns(&sheet, start, count)?)
        }
        Command::DeleteRange { sheet, range, shift } => {
            println!("{}", ops.delete_range(&sheet, &range, shift.into())?)
        }
        Command::CopyRange {
            sheet,
            src,
            dest,
            to_sheet,
        } => println!(
            "{}",
            ops.copy_range(&sheet, &src, &dest, to_sheet.as_deref())?
        ),
        Command::Merge { sheet, range } => println!("{}", ops.merge_cells(&sheet, &range)?),
        Command::Unmerge { sheet, range } => println!("{}", ops.unmerge_cells(&sheet, &range)?),
        Command::ListMerges { sheet } => {
            let merges = ops.list_merges(&sheet)?;
            println!("{}", serde_json::to_string_pretty(&merges)?);
        }
        Command::ListValidations { sheet } => {
            let rules = ops.list_validations(&sheet)?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
        Command::Sheets => {
            let sheets = ops.list_sheets()?;
            println!("{}", serde_json::to_string_pretty(&sheets)?);
        }
        Command::NewSheet { name } => println!("{}", ops.create_sheet(&name)?),
        Command::Write { sheet, start, data } => {
            let rows = parse_write_data(&data)?;
            println!("{}", ops.write_values(&sheet, &start, &rows)?);
        }
        Command::CopySheet { src, dst } => println!("{}", ops.copy_sheet(&src, &dst)?),
        Command::DeleteSheet { name } => println!("{}", ops.delete_sheet(&name)?),
        Command::RenameSheet { name, new_name } => {
            println!("{}", ops.rename_sheet(&name, &new_name)?)
        }
    }

    Ok(())
}

/// Parse the `write` command's JSON rows into cell values.
fn parse_write_data(data: &str) -> Result<Vec<Vec<Option<CellValue>>>> {
    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_str(data).context("DATA must be a JSON array of rows")?;
    rows.into_iter()
        .map(|row| row.into_iter().map(json_cell).collect())
        .collect()
}

fn json_cell(value: serde_json::Value) -> Result<Option<CellValue>> {
    use serde_json::Value;
    Ok(match value {
        Value::Null => None,
        Value::Bool(b) => Some(CellValue::Bool(b)),
        Value::Number(n) => {
            let n = n
                .as_f64()
                .with_context(|| format!("numeric cell value {} is out of range", n))?;
            Some(CellValue::Number(n))
        }
        Value::String(s) => Some(CellValue::Text(s)),
        other => anyhow::bail!("unsupported cell value: {}", other),
    })
}
