//! Per-date consolidation of an exported report.
//!
//! [`SummaryBuilder::summarize`] runs the whole pipeline over a workbook:
//! load, drop incomplete rows, promote the header, drop denylisted columns,
//! check the date/amount columns exist, coerce both, and sum amounts by date.
//!
//! Only the column check is strict. Cells that cannot be read as a date or an
//! amount drop their row silently.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use report_core::models::{CellValue, ColumnLayout, SummaryRow};
use report_core::{ReportError, Result};
use tracing::{debug, info};

use crate::loader::load_first_worksheet;
use crate::table::{HeaderedTable, RawTable};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Summarise the workbook at `path` with the default column layout.
pub fn summarize(path: &Path) -> Result<Vec<SummaryRow>> {
    SummaryBuilder::default().summarize(path)
}

/// Turns a raw exported worksheet into one [`SummaryRow`] per date.
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    layout: ColumnLayout,
}

impl SummaryBuilder {
    pub fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// Load the first worksheet of `path` and summarise it.
    pub fn summarize(&self, path: &Path) -> Result<Vec<SummaryRow>> {
        let raw = load_first_worksheet(path)?;
        let rows = self.summarize_table(raw)?;
        info!(
            "Summarised {} into {} dates",
            path.display(),
            rows.len()
        );
        Ok(rows)
    }

    /// Run the normalisation and aggregation stages over an already loaded
    /// table. Output is sorted by date with one row per date.
    pub fn summarize_table(&self, raw: RawTable) -> Result<Vec<SummaryRow>> {
        let table = self.normalize(raw);
        let (date_idx, amount_idx) = self.required_columns(&table)?;

        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut bad_dates = 0usize;
        let mut bad_amounts = 0usize;

        // Short rows in a hand-built table lack the cell and drop like a
        // missing value.
        for row in &table.rows {
            let Some(date) = row.get(date_idx).and_then(coerce_date) else {
                bad_dates += 1;
                continue;
            };
            let Some(amount) = row.get(amount_idx).and_then(coerce_amount) else {
                bad_amounts += 1;
                continue;
            };
            *totals.entry(date).or_insert(0.0) += amount;
        }

        debug!(
            rows = table.rows.len(),
            bad_dates, bad_amounts, "Coerced date and amount columns"
        );

        Ok(totals
            .into_iter()
            .map(|(date, amount)| SummaryRow { date, amount })
            .collect())
    }

    /// Completeness filter, header promotion and denylist removal, in that
    /// order.
    pub fn normalize(&self, raw: RawTable) -> HeaderedTable {
        raw.drop_incomplete_rows()
            .promote_header()
            .drop_columns(&self.layout.dropped_columns)
    }

    /// Indices of the date and amount columns, or a schema error naming the
    /// ones that are missing.
    fn required_columns(&self, table: &HeaderedTable) -> Result<(usize, usize)> {
        let date_idx = table.column_index(&self.layout.date_column);
        let amount_idx = table.column_index(&self.layout.amount_column);

        match (date_idx, amount_idx) {
            (Some(d), Some(a)) => Ok((d, a)),
            _ => {
                let mut missing = Vec::new();
                if date_idx.is_none() {
                    missing.push(self.layout.date_column.clone());
                }
                if amount_idx.is_none() {
                    missing.push(self.layout.amount_column.clone());
                }
                Err(ReportError::Schema { missing })
            }
        }
    }
}

// ── Coercion ──────────────────────────────────────────────────────────────────

/// Read a cell as a calendar date. Native date cells keep their date part;
/// text is tried against ISO and day-first layouts. Anything else is `None`.
pub fn coerce_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

/// Read a cell as a monetary amount. Numbers pass through; text must be a
/// plain decimal number. Non-finite values are rejected.
pub fn coerce_amount(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
