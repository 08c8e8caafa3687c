use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Required columns are absent once the table has been normalised.
    #[error("Expected columns not found: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A spreadsheet could not be opened or decoded.
    #[error("Failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// The workbook has no worksheet to read.
    #[error("Workbook has no worksheets: {0}")]
    EmptyWorkbook(PathBuf),

    /// The watched directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No spreadsheet arrived before the wait budget ran out.
    #[error("No recently downloaded spreadsheet found in {directory} after {waited_secs}s")]
    DownloadNotFound { directory: PathBuf, waited_secs: u64 },

    /// A branch code that is not in the registry.
    #[error("Unknown branch code: {0}")]
    UnknownBranch(u32),

    /// The external report trigger could not be run.
    #[error("Report trigger failed: {0}")]
    Trigger(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An output file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
