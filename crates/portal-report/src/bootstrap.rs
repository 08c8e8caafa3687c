use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use report_core::settings::Settings;
use report_runtime::trigger::Credentials;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber on stderr.
///
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(normalise_level(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();

    Ok(())
}

/// Map the CLI level names onto tracing directives.
fn normalise_level(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" | "CRITICAL" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

// ── Paths ──────────────────────────────────────────────────────────────────────

/// Canonical form of `path` when it exists, otherwise `path` joined onto the
/// current directory.
pub fn absolute(path: &Path) -> PathBuf {
    if let Ok(p) = std::fs::canonicalize(path) {
        return p;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

// ── Credentials ────────────────────────────────────────────────────────────────

/// Portal credentials for the trigger command.
///
/// Only needed when a trigger command is configured. A missing user is read
/// from stdin; a missing password is read from the terminal without echo.
pub fn resolve_credentials(settings: &Settings) -> anyhow::Result<Option<Credentials>> {
    resolve_credentials_with(
        settings,
        &mut std::io::stdin().lock(),
        &mut std::io::stderr(),
        |label| rpassword::prompt_password(label),
    )
}

fn resolve_credentials_with<R, W, P>(
    settings: &Settings,
    input: &mut R,
    out: &mut W,
    read_secret: P,
) -> anyhow::Result<Option<Credentials>>
where
    R: BufRead,
    W: Write,
    P: FnOnce(&str) -> std::io::Result<String>,
{
    if settings.trigger_command.is_none() {
        return Ok(None);
    }

    let user = match non_blank(settings.portal_user.as_deref()) {
        Some(u) => u.to_string(),
        None => prompt_from(input, out, "Portal user (or set PORTAL_USER): ")?,
    };
    let pass = match non_blank(settings.portal_pass.as_deref()) {
        Some(p) => p.to_string(),
        None => read_secret(PASSWORD_PROMPT)?,
    };

    Ok(Some(Credentials::new(&user, &pass)?))
}

const PASSWORD_PROMPT: &str = "Portal password (or set PORTAL_PASS): ";

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Write `label` to `out` and read one trimmed line from `input`.
fn prompt_from<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> std::io::Result<String> {
    out.write_all(label.as_bytes())?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
