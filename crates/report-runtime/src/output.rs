//! Persisting and printing the per-date summary.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use report_core::models::{total_amount, ColumnLayout, SummaryRow};
use report_core::{ReportError, Result};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `rows` as a two-column CSV (date, amount) with a UTF-8 byte-order
/// mark and a header named after the layout's columns. Parent directories
/// are created as needed.
pub fn write_summary_csv(path: &Path, rows: &[SummaryRow], layout: &ColumnLayout) -> Result<()> {
    let file_write = |source: std::io::Error| ReportError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(file_write)?;
    }

    let mut file = File::create(path).map_err(file_write)?;
    file.write_all(UTF8_BOM).map_err(file_write)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record([layout.date_column.as_str(), layout.amount_column.as_str()])?;
    for row in rows {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            format_amount(row.amount),
        ])?;
    }
    writer.flush().map_err(file_write)?;

    debug!("Wrote {} summary rows to {}", rows.len(), path.display());
    Ok(())
}

/// Render `rows` as an aligned text table with a closing total line.
pub fn render_summary(rows: &[SummaryRow], layout: &ColumnLayout) -> String {
    let total_label = "Total";
    let dates: Vec<String> = rows
        .iter()
        .map(|r| r.date.format("%Y-%m-%d").to_string())
        .collect();
    let amounts: Vec<String> = rows.iter().map(|r| format_amount(r.amount)).collect();
    let total = format_amount(total_amount(rows));

    let date_width = dates
        .iter()
        .map(|d| d.chars().count())
        .chain([layout.date_column.chars().count(), total_label.len()])
        .max()
        .unwrap_or(0);
    let amount_width = amounts
        .iter()
        .map(String::len)
        .chain([layout.amount_column.chars().count(), total.len()])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "{:>dw$}  {:>aw$}\n",
        layout.date_column,
        layout.amount_column,
        dw = date_width,
        aw = amount_width
    ));
    for (d, a) in dates.iter().zip(&amounts) {
        out.push_str(&format!("{:>dw$}  {:>aw$}\n", d, a, dw = date_width, aw = amount_width));
    }
    out.push_str(&format!(
        "{:>dw$}  {:>aw$}\n",
        total_label,
        total,
        dw = date_width,
        aw = amount_width
    ));
    out
}

/// Amounts are printed with two decimals.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
