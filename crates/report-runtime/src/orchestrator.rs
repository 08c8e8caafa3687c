//! Sequential report pipeline.
//!
//! Records the reference time, fires the trigger, waits for the download to
//! land, then summarises it. Everything runs on the calling thread.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use report_core::models::{CandidateFile, SummaryRow};
use report_core::{ReportError, Result};
use report_data::detector::{ArrivalWatcher, POLL_INTERVAL};
use report_data::summary::SummaryBuilder;
use tracing::info;

use crate::trigger::{ReportRequest, ReportTrigger};

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// A spreadsheet arrived and was summarised.
    Completed {
        source: CandidateFile,
        rows: Vec<SummaryRow>,
    },
    /// Nothing arrived before the wait budget ran out.
    DownloadMissing { directory: PathBuf, waited_secs: u64 },
}

impl PipelineOutcome {
    /// Convert a missing download into [`ReportError::DownloadNotFound`].
    pub fn into_result(self) -> Result<(CandidateFile, Vec<SummaryRow>)> {
        match self {
            PipelineOutcome::Completed { source, rows } => Ok((source, rows)),
            PipelineOutcome::DownloadMissing {
                directory,
                waited_secs,
            } => Err(ReportError::DownloadNotFound {
                directory,
                waited_secs,
            }),
        }
    }
}

// ── ReportPipeline ────────────────────────────────────────────────────────────

/// Trigger → detect → summarise, in that order.
pub struct ReportPipeline {
    trigger: Box<dyn ReportTrigger>,
    downloads_dir: PathBuf,
    wait_secs: u64,
    poll_interval: Duration,
    builder: SummaryBuilder,
}

impl ReportPipeline {
    /// # Parameters
    /// - `trigger`       – what starts the download.
    /// - `downloads_dir` – directory the browser saves into.
    /// - `wait_secs`     – how long to wait for the file to appear.
    /// - `builder`       – summary builder with the column layout to use.
    pub fn new(
        trigger: Box<dyn ReportTrigger>,
        downloads_dir: impl Into<PathBuf>,
        wait_secs: u64,
        builder: SummaryBuilder,
    ) -> Self {
        Self {
            trigger,
            downloads_dir: downloads_dir.into(),
            wait_secs,
            poll_interval: POLL_INTERVAL,
            builder,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the pipeline once for `request`.
    ///
    /// Fails when the download directory is missing, the trigger cannot run,
    /// or the arrived spreadsheet cannot be read or lacks the required
    /// columns. A download that never shows up is a normal outcome.
    pub fn run(&self, request: &ReportRequest) -> Result<PipelineOutcome> {
        if !self.downloads_dir.is_dir() {
            return Err(ReportError::DataPathNotFound(self.downloads_dir.clone()));
        }

        let reference = SystemTime::now();
        self.trigger.trigger(request)?;

        info!(
            "Waiting up to {}s for a spreadsheet in {}",
            self.wait_secs,
            self.downloads_dir.display()
        );
        let found = ArrivalWatcher::new(&self.downloads_dir, reference)
            .with_poll_interval(self.poll_interval)
            .wait(Duration::from_secs(self.wait_secs));

        let Some(source) = found else {
            return Ok(PipelineOutcome::DownloadMissing {
                directory: self.downloads_dir.clone(),
                waited_secs: self.wait_secs,
            });
        };

        info!("Detected download {}", source.path.display());
        let rows = self.builder.summarize(&source.path)?;
        Ok(PipelineOutcome::Completed { source, rows })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    fn request() -> ReportRequest {
        ReportRequest {
            portal_url: "https://portal.example/login".to_string(),
            credentials: None,
            branch_name: "FILIAL 43".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn write_export(path: &Path, header: &[&str]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Relatório").unwrap();
        for (col, label) in header.iter().enumerate() {
            sheet.write_string(1, col as u16, *label).unwrap();
        }
        sheet.write_string(2, 0, "2024-01-15").unwrap();
        sheet.write_number(2, 1, 10.0).unwrap();
        sheet.write_string(3, 0, "2024-01-15").unwrap();
        sheet.write_string(3, 1, "2.5").unwrap();
        workbook.save(path).unwrap();
    }

    fn pipeline(trigger: Box<dyn ReportTrigger>, dir: &Path, wait_secs: u64) -> ReportPipeline {
        ReportPipeline::new(trigger, dir, wait_secs, SummaryBuilder::default())
            .with_poll_interval(Duration::from_millis(50))
    }

    #[test]
    fn test_run_completes_when_trigger_downloads() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("relatorio.xlsx");
        let written = target.clone();
        let trigger = move |_: &ReportRequest| -> Result<()> {
            // Filesystem timestamps can trail the wall clock slightly.
            std::thread::sleep(Duration::from_millis(50));
            write_export(&written, &["Data", "Quantia"]);
            Ok(())
        };

        let outcome = pipeline(Box::new(trigger), dir.path(), 5)
            .run(&request())
            .unwrap();
        let (source, rows) = outcome.into_result().unwrap();
        assert_eq!(source.path, target);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!((rows[0].amount - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_run_ignores_stale_download() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("old.xlsx");
        write_export(&stale, &["Data", "Quantia"]);
        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(600))
            .unwrap();

        let outcome = pipeline(Box::new(crate::trigger::ManualTrigger), dir.path(), 1)
            .run(&request())
            .unwrap();
        match outcome {
            PipelineOutcome::DownloadMissing {
                directory,
                waited_secs,
            } => {
                assert_eq!(directory, dir.path());
                assert_eq!(waited_secs, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_download_missing_into_result() {
        let outcome = PipelineOutcome::DownloadMissing {
            directory: PathBuf::from("/downloads"),
            waited_secs: 20,
        };
        assert!(matches!(
            outcome.into_result(),
            Err(ReportError::DownloadNotFound { waited_secs: 20, .. })
        ));
    }

    #[test]
    fn test_run_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = pipeline(Box::new(crate::trigger::ManualTrigger), &missing, 1)
            .run(&request())
            .unwrap_err();
        assert!(matches!(err, ReportError::DataPathNotFound(_)));
    }

    #[test]
    fn test_run_propagates_trigger_failure() {
        let dir = TempDir::new().unwrap();
        let trigger = |_: &ReportRequest| -> Result<()> {
            Err(ReportError::Trigger("browser not found".to_string()))
        };
        let err = pipeline(Box::new(trigger), dir.path(), 1)
            .run(&request())
            .unwrap_err();
        assert!(matches!(err, ReportError::Trigger(_)));
    }

    #[test]
    fn test_run_propagates_schema_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("relatorio.xlsx");
        let trigger = move |_: &ReportRequest| -> Result<()> {
            std::thread::sleep(Duration::from_millis(50));
            write_export(&target, &["Data", "Valor"]);
            Ok(())
        };
        let err = pipeline(Box::new(trigger), dir.path(), 5)
            .run(&request())
            .unwrap_err();
        assert!(matches!(err, ReportError::Schema { .. }));
    }
}
