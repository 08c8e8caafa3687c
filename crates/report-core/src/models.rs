use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{NaiveDate, NaiveDateTime};

// ── Accepted extensions ───────────────────────────────────────────────────────

/// Spreadsheet extensions the arrival detector accepts (compared lowercase).
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Returns `true` when `ext` is an accepted spreadsheet extension,
/// ignoring ASCII case.
pub fn is_spreadsheet_extension(ext: &str) -> bool {
    SPREADSHEET_EXTENSIONS
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(ext))
}

// ── CandidateFile ─────────────────────────────────────────────────────────────

/// A spreadsheet found in the watched directory during one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Extension in lowercase, without the dot (`"xlsx"` or `"xls"`).
    pub extension: String,
    /// Last-modified time reported by the filesystem.
    pub modified: SystemTime,
}

// ── CellValue ─────────────────────────────────────────────────────────────────

/// A single spreadsheet cell, reduced to the shapes the pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// A cell counts as missing when it is empty, holds an empty string or is
    /// NaN. Whitespace-only text is a present value.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Bool(_) | CellValue::DateTime(_) => false,
        }
    }

    /// Text used when the cell is promoted to a column label.
    pub fn label(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// ── SummaryRow ────────────────────────────────────────────────────────────────

/// Total amount for one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Sum of every row's amount.
pub fn total_amount(rows: &[SummaryRow]) -> f64 {
    rows.iter().fold(0.0, |acc, r| acc + r.amount)
}

// ── ColumnLayout ──────────────────────────────────────────────────────────────

/// Columns the exported report never needs for the monetary summary.
pub const DEFAULT_DROPPED_COLUMNS: &[&str] = &[
    "Descrição",
    "Moeda",
    "Couried ID",
    "Register ID",
    "Register Name",
    "Bar Code",
    "Strap Seal Code",
    "Courier Name",
];

pub const DEFAULT_DATE_COLUMN: &str = "Data";
pub const DEFAULT_AMOUNT_COLUMN: &str = "Quantia";

/// Column labels the summary builder works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date_column: String,
    pub amount_column: String,
    /// Best-effort denylist; labels that are not present are ignored.
    pub dropped_columns: Vec<String>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            amount_column: DEFAULT_AMOUNT_COLUMN.to_string(),
            dropped_columns: DEFAULT_DROPPED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl ColumnLayout {
    /// Default denylist with custom date/amount labels.
    pub fn with_columns(date_column: impl Into<String>, amount_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            amount_column: amount_column.into(),
            ..Self::default()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
