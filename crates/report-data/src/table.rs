//! In-memory tables for an exported worksheet.
//!
//! A worksheet goes through two explicit states:
//!
//! * [`RawTable`] – rows as loaded, labelled with provisional names taken
//!   from the first worksheet row.
//! * [`HeaderedTable`] – the first fully populated data row has been promoted
//!   to the real column labels.
//!
//! Incomplete rows must be dropped while the table is still raw, before the
//! header is promoted.

use report_core::models::CellValue;
use tracing::debug;

// ── RawTable ──────────────────────────────────────────────────────────────────

/// Worksheet rows before header promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Provisional labels, one per column.
    pub labels: Vec<String>,
    /// Data rows, each padded to `labels.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table from worksheet rows.
    ///
    /// The first row supplies the provisional labels; blank cells there are
    /// named `Unnamed: <index>`. Every later row is data. Rows shorter than
    /// the widest row are padded with empty cells.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut iter = rows.into_iter();

        let labels = match iter.next() {
            Some(first) => (0..width)
                .map(|i| match first.get(i) {
                    Some(cell) if !cell.is_missing() => cell.label(),
                    _ => format!("Unnamed: {}", i),
                })
                .collect(),
            None => Vec::new(),
        };

        let rows = iter
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self { labels, rows }
    }

    /// Discard every row that has a missing value in any column.
    pub fn drop_incomplete_rows(mut self) -> Self {
        let before = self.rows.len();
        self.rows
            .retain(|row| row.iter().all(|cell| !cell.is_missing()));
        debug!(
            "Dropped {} incomplete rows, {} remain",
            before - self.rows.len(),
            self.rows.len()
        );
        self
    }

    /// Use the first remaining row as the column labels and remove it from
    /// the data. The provisional labels are discarded.
    ///
    /// A table without rows becomes a headered table with no columns.
    pub fn promote_header(self) -> HeaderedTable {
        let mut rows = self.rows.into_iter();
        let Some(header) = rows.next() else {
            return HeaderedTable {
                columns: Vec::new(),
                rows: Vec::new(),
            };
        };

        HeaderedTable {
            columns: header.iter().map(CellValue::label).collect(),
            rows: rows.collect(),
        }
    }
}

// ── HeaderedTable ─────────────────────────────────────────────────────────────

/// Worksheet rows labelled by their real header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl HeaderedTable {
    /// Remove every column whose label is in `labels`. Labels that are not
    /// present are ignored.
    pub fn drop_columns<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !labels.iter().any(|l| l.as_ref() == c))
            .collect();

        if keep.iter().all(|k| *k) {
            return self;
        }

        self.columns = retain_by_mask(self.columns, &keep);
        self.rows = self
            .rows
            .into_iter()
            .map(|row| retain_by_mask(row, &keep))
            .collect();
        self
    }

    /// Position of the first column labelled `label`.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep.iter())
        .filter(|(_, k)| **k)
        .map(|(item, _)| item)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
