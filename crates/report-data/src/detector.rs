//! Arrival detection for downloaded spreadsheets.
//!
//! Polls a download directory for the newest `.xlsx`/`.xls` file modified at
//! or after a reference time. The directory is only ever read.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use report_core::models::{is_spreadsheet_extension, CandidateFile};
use tracing::{debug, warn};

/// Pause between two polls of the download directory.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

// ── Public API ────────────────────────────────────────────────────────────────

/// Return the most recently modified spreadsheet in `directory` whose
/// modification time is at or after `after`.
///
/// Only direct entries are considered. Entries that vanish or cannot be
/// stat'ed while enumerating are skipped. When several files share the
/// newest timestamp, the last one enumerated wins.
pub fn find_recent_spreadsheet(directory: &Path, after: SystemTime) -> Option<CandidateFile> {
    if !directory.is_dir() {
        warn!("Download directory does not exist: {}", directory.display());
        return None;
    }

    walkdir::WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter_map(|entry| to_candidate(&entry))
        .filter(|candidate| candidate.modified >= after)
        .max_by_key(|candidate| candidate.modified)
}

/// Poll [`find_recent_spreadsheet`] every [`POLL_INTERVAL`] until a file shows
/// up or `timeout_secs` have elapsed.
pub fn await_recent_spreadsheet(
    directory: &Path,
    after: SystemTime,
    timeout_secs: u64,
) -> Option<CandidateFile> {
    ArrivalWatcher::new(directory, after).wait(Duration::from_secs(timeout_secs))
}

// ── ArrivalWatcher ────────────────────────────────────────────────────────────

/// Blocking poller over one download directory.
pub struct ArrivalWatcher<'a> {
    directory: &'a Path,
    after: SystemTime,
    poll_interval: Duration,
}

impl<'a> ArrivalWatcher<'a> {
    pub fn new(directory: &'a Path, after: SystemTime) -> Self {
        Self {
            directory,
            after,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the pause between polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Block until a candidate is found or `timeout` runs out.
    ///
    /// The deadline is fixed when the call starts. The directory is always
    /// checked at least once, and once more when the deadline is reached,
    /// so a slow poll can never push the loop past it by more than one
    /// check. A timeout too large to represent never expires.
    pub fn wait(&self, timeout: Duration) -> Option<CandidateFile> {
        let deadline = Instant::now().checked_add(timeout);
        let mut polls = 0u32;

        loop {
            polls = polls.saturating_add(1);
            if let Some(found) = find_recent_spreadsheet(self.directory, self.after) {
                debug!(polls, "Spreadsheet detected: {}", found.path.display());
                return Some(found);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(
                            polls,
                            "No spreadsheet in {} before the deadline",
                            self.directory.display()
                        );
                        return None;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };

            thread::sleep(pause);
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn to_candidate(entry: &walkdir::DirEntry) -> Option<CandidateFile> {
    if !entry.file_type().is_file() {
        return None;
    }

    let extension = entry.path().extension()?.to_str()?;
    if !is_spreadsheet_extension(extension) {
        return None;
    }

    let modified = match entry
        .metadata()
        .map_err(|e| e.to_string())
        .and_then(|m| m.modified().map_err(|e| e.to_string()))
    {
        Ok(t) => t,
        Err(e) => {
            debug!("Cannot stat {}: {}", entry.path().display(), e);
            return None;
        }
    };

    Some(CandidateFile {
        path: entry.path().to_path_buf(),
        extension: extension.to_ascii_lowercase(),
        modified,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Whole-second reference an hour in the past, so stored mtimes compare
    /// exactly on filesystems with coarse timestamps.
    fn reference() -> SystemTime {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        SystemTime::UNIX_EPOCH + Duration::from_secs(now - 3600)
    }

    /// Create `name` in `dir` with its modification time set to `mtime`.
    fn touch(dir: &Path, name: &str, mtime: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(mtime).unwrap();
        path
    }

    // ── find_recent_spreadsheet ───────────────────────────────────────────────

    #[test]
    fn test_find_returns_newest_after_reference() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        touch(dir.path(), "old.xlsx", t0 - Duration::from_secs(60));
        touch(dir.path(), "first.xlsx", t0 + Duration::from_secs(10));
        let newest = touch(dir.path(), "second.xls", t0 + Duration::from_secs(20));

        let found = find_recent_spreadsheet(dir.path(), t0).unwrap();
        assert_eq!(found.path, newest);
        assert_eq!(found.extension, "xls");
        assert_eq!(found.modified, t0 + Duration::from_secs(20));
    }

    #[test]
    fn test_find_ignores_stale_files() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        touch(dir.path(), "stale.xlsx", t0 - Duration::from_secs(1));

        assert!(find_recent_spreadsheet(dir.path(), t0).is_none());
    }

    #[test]
    fn test_find_includes_file_at_exact_reference() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let exact = touch(dir.path(), "exact.xlsx", t0);

        assert_eq!(find_recent_spreadsheet(dir.path(), t0).unwrap().path, exact);
    }

    #[test]
    fn test_find_ignores_other_extensions() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        touch(dir.path(), "report.csv", t0 + Duration::from_secs(30));
        touch(dir.path(), "report.xlsx.crdownload", t0 + Duration::from_secs(40));
        touch(dir.path(), "no_extension", t0 + Duration::from_secs(50));
        let wanted = touch(dir.path(), "report.xlsx", t0 + Duration::from_secs(5));

        assert_eq!(find_recent_spreadsheet(dir.path(), t0).unwrap().path, wanted);
    }

    #[test]
    fn test_find_extension_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let upper = touch(dir.path(), "REPORT.XLSX", t0 + Duration::from_secs(5));

        let found = find_recent_spreadsheet(dir.path(), t0).unwrap();
        assert_eq!(found.path, upper);
        assert_eq!(found.extension, "xlsx");
    }

    #[test]
    fn test_find_ignores_directories() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        std::fs::create_dir(dir.path().join("folder.xlsx")).unwrap();

        assert!(find_recent_spreadsheet(dir.path(), t0).is_none());
    }

    #[test]
    fn test_find_does_not_recurse() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        touch(&sub, "inner.xlsx", t0 + Duration::from_secs(5));

        assert!(find_recent_spreadsheet(dir.path(), t0).is_none());
    }

    #[test]
    fn test_find_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(find_recent_spreadsheet(dir.path(), reference()).is_none());
    }

    #[test]
    fn test_find_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(find_recent_spreadsheet(&missing, reference()).is_none());
    }

    #[test]
    fn test_find_tie_returns_a_maximal_entry() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let t = t0 + Duration::from_secs(10);
        let a = touch(dir.path(), "a.xlsx", t);
        let b = touch(dir.path(), "b.xlsx", t);
        touch(dir.path(), "older.xlsx", t0 + Duration::from_secs(1));

        let found = find_recent_spreadsheet(dir.path(), t0).unwrap();
        assert_eq!(found.modified, t);
        assert!(found.path == a || found.path == b);
    }

    // ── await_recent_spreadsheet ──────────────────────────────────────────────

    #[test]
    fn test_await_returns_immediately_when_present() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let path = touch(dir.path(), "ready.xlsx", t0 + Duration::from_secs(1));

        let started = Instant::now();
        let found = await_recent_spreadsheet(dir.path(), t0, 10).unwrap();
        assert_eq!(found.path, path);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_await_times_out_no_earlier_than_deadline() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        touch(dir.path(), "stale.xlsx", t0 - Duration::from_secs(5));

        let started = Instant::now();
        assert!(await_recent_spreadsheet(dir.path(), t0, 2).is_none());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[test]
    fn test_await_zero_timeout_checks_once() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();

        assert!(await_recent_spreadsheet(dir.path(), t0, 0).is_none());

        let path = touch(dir.path(), "now.xls", t0 + Duration::from_secs(1));
        assert_eq!(await_recent_spreadsheet(dir.path(), t0, 0).unwrap().path, path);
    }

    #[test]
    fn test_await_unbounded_timeout_returns_present_file() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let path = touch(dir.path(), "x.xlsx", t0 + Duration::from_secs(1));

        let found = await_recent_spreadsheet(dir.path(), t0, u64::MAX).unwrap();
        assert_eq!(found.path, path);
    }

    #[test]
    fn test_await_detects_file_arriving_later() {
        let dir = TempDir::new().unwrap();
        let t0 = reference();
        let target = dir.path().join("late.xlsx");

        let writer_path = target.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            File::create(&writer_path).unwrap();
        });

        let started = Instant::now();
        let found = ArrivalWatcher::new(dir.path(), t0)
            .with_poll_interval(Duration::from_millis(50))
            .wait(Duration::from_secs(5));
        writer.join().unwrap();

        assert_eq!(found.unwrap().path, target);
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
