use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::branches;
use crate::error::{ReportError, Result};
use crate::models::{ColumnLayout, DEFAULT_AMOUNT_COLUMN, DEFAULT_DATE_COLUMN};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Download a periodic report from the web portal and consolidate amounts by date
#[derive(Parser, Debug, Clone)]
#[command(
    name = "portal-report",
    about = "Download a periodic report from the web portal and consolidate amounts by date",
    version
)]
pub struct Settings {
    /// Report start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Report end date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end_date: NaiveDate,

    /// Branch code (e.g. 34)
    #[arg(long)]
    pub branch_code: u32,

    /// Directory the browser downloads into (default: the platform download dir)
    #[arg(long)]
    pub downloads_dir: Option<PathBuf>,

    /// Output CSV with the per-date summary
    #[arg(long, default_value = "output/resumo.csv")]
    pub output: PathBuf,

    /// Maximum seconds to wait for the download to appear
    #[arg(long, default_value = "20")]
    pub wait_download_seconds: u64,

    /// Portal login URL
    #[arg(long, env = "PORTAL_URL", default_value = "https://example.com/login")]
    pub portal_url: String,

    /// Portal user name
    #[arg(long, env = "PORTAL_USER")]
    pub portal_user: Option<String>,

    /// Portal password
    #[arg(long, env = "PORTAL_PASS", hide_env_values = true)]
    pub portal_pass: Option<String>,

    /// External program that drives the browser to download the report
    #[arg(long)]
    pub trigger_command: Option<PathBuf>,

    /// Extra argument for the trigger command (repeatable)
    #[arg(long = "trigger-arg", allow_hyphen_values = true)]
    pub trigger_args: Vec<String>,

    /// Label of the date column in the exported report
    #[arg(long, default_value = DEFAULT_DATE_COLUMN)]
    pub date_column: String,

    /// Label of the amount column in the exported report
    #[arg(long, default_value = DEFAULT_AMOUNT_COLUMN)]
    pub amount_column: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {:?}: {}", s, e))
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.portal-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_download_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".portal-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge last-used params for anything not given
    /// explicitly, then persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with an explicit argument list
    /// and config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return settings;
        }

        let last = LastUsedParams::load_from(config_path);

        if !is_arg_explicitly_set(&matches, "downloads_dir") && settings.downloads_dir.is_none() {
            settings.downloads_dir = last.downloads_dir;
        }
        if !is_arg_explicitly_set(&matches, "wait_download_seconds") {
            if let Some(v) = last.wait_download_seconds {
                settings.wait_download_seconds = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used parameters");
        }

        settings
    }

    /// Reject inconsistent combinations clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(ReportError::Config(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if self.date_column.trim().is_empty() || self.amount_column.trim().is_empty() {
            return Err(ReportError::Config(
                "date and amount column labels must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Portal name of the configured branch.
    pub fn branch_name(&self) -> Result<&'static str> {
        branches::branch_name(self.branch_code)
            .ok_or(ReportError::UnknownBranch(self.branch_code))
    }

    /// Download directory: explicit value, else the platform download dir,
    /// else `~/Downloads`.
    pub fn resolved_downloads_dir(&self) -> PathBuf {
        if let Some(dir) = &self.downloads_dir {
            return dir.clone();
        }
        dirs::download_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Downloads")
        })
    }

    pub fn column_layout(&self) -> ColumnLayout {
        ColumnLayout::with_columns(self.date_column.trim(), self.amount_column.trim())
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            downloads_dir: s.downloads_dir.clone(),
            wait_download_seconds: Some(s.wait_download_seconds),
            output: Some(s.output.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied on the command line rather than
/// through a default or an environment variable.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
