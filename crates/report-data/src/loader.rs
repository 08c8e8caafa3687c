//! Spreadsheet loading.
//!
//! Opens `.xlsx`/`.xls` workbooks with `calamine` and converts the first
//! worksheet into a [`RawTable`].

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use report_core::models::CellValue;
use report_core::{ReportError, Result};
use tracing::debug;

use crate::table::RawTable;

/// Load the first worksheet of the workbook at `path`.
pub fn load_first_worksheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReportError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::EmptyWorkbook(path.to_path_buf()))?
        .map_err(|e| ReportError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(to_cell).collect())
        .collect();

    debug!(
        "Loaded {} rows x {} columns from {}",
        rows.len(),
        range.width(),
        path.display()
    );

    Ok(RawTable::from_rows(rows))
}

/// Map a calamine cell onto [`CellValue`]. Error cells count as empty.
fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => data
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
