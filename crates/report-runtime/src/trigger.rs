//! The seam between the pipeline and whatever makes the portal produce the
//! report.
//!
//! The pipeline never checks whether a trigger actually caused a download;
//! it only watches the download directory afterwards.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use chrono::NaiveDate;
use report_core::{ReportError, Result};
use tracing::{info, warn};

// ── Request ───────────────────────────────────────────────────────────────────

/// Portal login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Both fields must be non-empty after trimming.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ReportError::Config(
                "portal user/password not provided; use PORTAL_USER/PORTAL_PASS or type them at the prompt"
                    .to_string(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything a trigger needs to ask the portal for one report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub portal_url: String,
    pub credentials: Option<Credentials>,
    pub branch_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// ── ReportTrigger ─────────────────────────────────────────────────────────────

/// Starts the report download. Returning `Ok` only means the trigger ran.
pub trait ReportTrigger {
    fn trigger(&self, request: &ReportRequest) -> Result<()>;
}

impl<F> ReportTrigger for F
where
    F: Fn(&ReportRequest) -> Result<()>,
{
    fn trigger(&self, request: &ReportRequest) -> Result<()> {
        self(request)
    }
}

/// Leaves the download to the operator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualTrigger;

impl ReportTrigger for ManualTrigger {
    fn trigger(&self, request: &ReportRequest) -> Result<()> {
        info!(
            "Download the report for {} ({} to {}) from {} now",
            request.branch_name, request.start_date, request.end_date, request.portal_url
        );
        Ok(())
    }
}

/// Runs an external program that drives the browser.
///
/// The request is passed through `PORTAL_URL`, `PORTAL_USER`, `PORTAL_PASS`,
/// `REPORT_BRANCH`, `REPORT_START_DATE` and `REPORT_END_DATE`. The call
/// blocks until the program exits.
#[derive(Debug, Clone)]
pub struct CommandTrigger {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTrigger {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ReportTrigger for CommandTrigger {
    fn trigger(&self, request: &ReportRequest) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("PORTAL_URL", &request.portal_url)
            .env("REPORT_BRANCH", &request.branch_name)
            .env("REPORT_START_DATE", request.start_date.format("%Y-%m-%d").to_string())
            .env("REPORT_END_DATE", request.end_date.format("%Y-%m-%d").to_string());
        if let Some(creds) = &request.credentials {
            command
                .env("PORTAL_USER", &creds.username)
                .env("PORTAL_PASS", &creds.password);
        }

        info!("Running report trigger {}", self.program.display());
        let status = command.status().map_err(|e| {
            ReportError::Trigger(format!("failed to launch {}: {}", self.program.display(), e))
        })?;

        // Exit status is not proof either way; the download directory decides.
        if !status.success() {
            warn!("Report trigger {} exited with {}", self.program.display(), status);
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
