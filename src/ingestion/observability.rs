use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::error::LoadError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadSeverity {
    /// A file was skipped because of its header; nothing from it was written.
    Warning,
    /// A file was skipped because it could not be read.
    Error,
    /// The run was aborted (connection or database failure).
    Critical,
}

impl fmt::Display for LoadSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadSeverity::Warning => "warning",
            LoadSeverity::Error => "error",
            LoadSeverity::Critical => "critical",
        })
    }
}

/// Context about the file being loaded.
#[derive(Debug, Clone)]
pub struct FileContext {
    /// The input path.
    pub path: PathBuf,
    /// Target table.
    pub table: String,
}

/// Stats reported when a file has been fully loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStats {
    /// Number of inserted rows.
    pub rows: u64,
    /// Number of batched inserts issued.
    pub batches: u64,
}

/// Observer interface for load outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait LoadObserver: Send + Sync {
    /// Called when a file has been loaded completely.
    fn on_file_loaded(&self, _ctx: &FileContext, _stats: FileStats) {}

    /// Called after each batched insert.
    fn on_batch_flushed(&self, _ctx: &FileContext, _batch_no: u64, _rows: usize) {}

    /// Called when a file is skipped or the run is aborted.
    fn on_failure(&self, _ctx: &FileContext, _severity: LoadSeverity, _error: &LoadError) {}

    /// Called when a failure meets the loader's alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LoadObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn LoadObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl LoadObserver for CompositeObserver {
    fn on_file_loaded(&self, ctx: &FileContext, stats: FileStats) {
        for o in &self.observers {
            o.on_file_loaded(ctx, stats);
        }
    }

    fn on_batch_flushed(&self, ctx: &FileContext, batch_no: u64, rows: usize) {
        for o in &self.observers {
            o.on_batch_flushed(ctx, batch_no, rows);
        }
    }

    fn on_failure(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits load events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_file_loaded(&self, ctx: &FileContext, stats: FileStats) {
        info!(
            path = %ctx.path.display(),
            table = %ctx.table,
            rows = stats.rows,
            batches = stats.batches,
            "file loaded"
        );
    }

    fn on_failure(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        match severity {
            LoadSeverity::Critical => {
                error!(path = %ctx.path.display(), table = %ctx.table, %error, "load aborted")
            }
            _ => warn!(path = %ctx.path.display(), %severity, %error, "file skipped"),
        }
    }

    fn on_alert(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        error!(
            alert = true,
            path = %ctx.path.display(),
            table = %ctx.table,
            %severity,
            %error,
            "load alert"
        );
    }
}

/// Appends one `key=value` line per load event to a log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileObserver {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: &str, ctx: &FileContext, details: fmt::Arguments<'_>) {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        // Observers must not fail the load.
        if let Err(e) = writeln!(
            file,
            "ts={ts} event={event} table={} path={} {details}",
            ctx.table,
            ctx.path.display()
        ) {
            warn!(log = %self.path.display(), error = %e, "cannot write load event");
        }
    }
}

impl LoadObserver for FileObserver {
    fn on_file_loaded(&self, ctx: &FileContext, stats: FileStats) {
        self.record(
            "loaded",
            ctx,
            format_args!("rows={} batches={}", stats.rows, stats.batches),
        );
    }

    fn on_failure(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        let event = match severity {
            LoadSeverity::Critical => "aborted",
            LoadSeverity::Warning | LoadSeverity::Error => "skipped",
        };
        self.record(event, ctx, format_args!("severity={severity} error=\"{error}\""));
    }

    fn on_alert(&self, ctx: &FileContext, severity: LoadSeverity, error: &LoadError) {
        self.record("alert", ctx, format_args!("severity={severity} error=\"{error}\""));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_observer_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("load.log");
        let ctx = FileContext {
            path: PathBuf::from("people.csv"),
            table: "PEOPLE".to_string(),
        };

        let obs = FileObserver::open(&log).unwrap();
        obs.on_file_loaded(&ctx, FileStats { rows: 3, batches: 1 });
        obs.on_failure(&ctx, LoadSeverity::Warning, &LoadError::header("people.csv", "blank"));
        drop(obs);
        // Reopening appends rather than truncating.
        FileObserver::open(&log)
            .unwrap()
            .on_failure(&ctx, LoadSeverity::Critical, &LoadError::Config { message: "x".into() });

        let text = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("event=loaded table=PEOPLE path=people.csv rows=3 batches=1"));
        assert!(lines[1].contains("event=skipped"));
        assert!(lines[1].contains("severity=warning"));
        assert!(lines[2].contains("event=aborted"));
        assert!(lines[2].contains("severity=critical"));
    }

    #[test]
    fn file_observer_fails_on_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileObserver::open(dir.path().join("missing").join("load.log")).is_err());
    }

    #[test]
    fn severities_are_ordered() {
        assert!(LoadSeverity::Critical > LoadSeverity::Error);
        assert!(LoadSeverity::Error > LoadSeverity::Warning);
    }
}
