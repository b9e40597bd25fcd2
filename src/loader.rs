//! Batched loading of discovered files into one table.
//!
//! For each file the loader runs `open → read header → (read row → buffer)* → flush → close`
//! against a caller-owned [`DatabaseConnection`]:
//!
//! - a file that cannot be opened or read, or whose header is unusable, is reported and skipped
//! - blank lines are skipped silently
//! - a full [`Batch`] is inserted with one [`DatabaseConnection::execute_batch`] call
//! - a failed insert ends the whole run; batches flushed before it are not rolled back
//!
//! Committing and closing the connection is left to the caller.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::db::DatabaseConnection;
use crate::error::{ErrorScope, LoadError, LoadResult};
use crate::ingestion::observability::{FileContext, FileStats, LoadObserver, LoadSeverity};
use crate::ingestion::{find_all_files, format_record, get_reader, open_file, read_header};
use crate::types::{Batch, HeaderRecord, LoaderConfig};

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(FileStats),
    /// The file failed; `flushed` counts the batches written before the failure, which stay in
    /// the table.
    Skipped { error: LoadError, flushed: FileStats },
}

/// Per-file results of a run, in processing order.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl LoadReport {
    pub fn files_loaded(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, o)| matches!(o, FileOutcome::Loaded(_)))
            .count()
    }

    pub fn files_skipped(&self) -> usize {
        self.files.len() - self.files_loaded()
    }

    /// Total rows inserted, including rows flushed from files that failed part-way.
    pub fn rows_loaded(&self) -> u64 {
        self.files
            .iter()
            .map(|(_, o)| match o {
                FileOutcome::Loaded(stats) | FileOutcome::Skipped { flushed: stats, .. } => stats.rows,
            })
            .sum()
    }
}

/// Loads files into [`LoaderConfig::table`] through a borrowed connection.
pub struct BatchLoader<'c> {
    conn: &'c mut dyn DatabaseConnection,
    config: LoaderConfig,
    observer: Option<Arc<dyn LoadObserver>>,
    alert_at_or_above: LoadSeverity,
}

impl fmt::Debug for BatchLoader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchLoader")
            .field("db_type", &self.conn.db_type())
            .field("config", &self.config)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl<'c> BatchLoader<'c> {
    /// Create a loader; fails if `config` does not validate.
    pub fn new(conn: &'c mut dyn DatabaseConnection, config: LoaderConfig) -> LoadResult<Self> {
        config.validate()?;
        Ok(Self {
            conn,
            config,
            observer: None,
            alert_at_or_above: LoadSeverity::Critical,
        })
    }

    /// Attach an observer for load events.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at which `on_alert` is invoked in addition to `on_failure`.
    pub fn alert_at_or_above(mut self, severity: LoadSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Discover files with [`find_all_files`] and load them.
    pub fn load_pattern(&mut self, pattern: &str) -> LoadResult<LoadReport> {
        let files = find_all_files(pattern)?;
        info!(pattern, files = files.len(), "found files to load");
        self.load_files(files.as_slice())
    }

    /// Load `files` in order.
    ///
    /// Returns `Err` only for run-level failures (truncate or insert errors); per-file failures
    /// are recorded in the [`LoadReport`] and the run continues.
    pub fn load_files<P: AsRef<Path>>(&mut self, files: &[P]) -> LoadResult<LoadReport> {
        if self.config.truncate {
            info!(table = %self.config.table, "truncating table");
            if let Err(e) = self.conn.truncate(&self.config.table) {
                let err = LoadError::from(e);
                error!(table = %self.config.table, error = %err, "truncate failed; aborting load");
                return Err(err);
            }
        }

        let mut report = LoadReport::default();
        for path in files {
            let path = path.as_ref();
            let ctx = FileContext {
                path: path.to_path_buf(),
                table: self.config.table.clone(),
            };

            let mut stats = FileStats::default();
            match self.load_file_with(&ctx, &mut stats) {
                Ok(()) => {
                    info!(path = %path.display(), rows = stats.rows, batches = stats.batches, "file loaded");
                    if let Some(obs) = &self.observer {
                        obs.on_file_loaded(&ctx, stats);
                    }
                    report.files.push((path.to_path_buf(), FileOutcome::Loaded(stats)));
                }
                Err(e) => {
                    self.notify_failure(&ctx, &e);
                    match e.scope() {
                        ErrorScope::SkipFile => {
                            warn!(
                                path = %path.display(),
                                error = %e,
                                rows_flushed = stats.rows,
                                "skipping file"
                            );
                            report.files.push((
                                path.to_path_buf(),
                                FileOutcome::Skipped {
                                    error: e,
                                    flushed: stats,
                                },
                            ));
                        }
                        ErrorScope::AbortRun => {
                            error!(path = %path.display(), error = %e, "aborting load");
                            return Err(e);
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    /// Load a single file. Per-file failures are returned as errors rather than recorded.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> LoadResult<FileStats> {
        let ctx = FileContext {
            path: path.as_ref().to_path_buf(),
            table: self.config.table.clone(),
        };
        let mut stats = FileStats::default();
        self.load_file_with(&ctx, &mut stats)?;
        Ok(stats)
    }

    fn load_file_with(&mut self, ctx: &FileContext, stats: &mut FileStats) -> LoadResult<()> {
        let path = ctx.path.as_path();
        info!(path = %path.display(), table = %ctx.table, "loading file");

        // Dropping the reader on any return path closes the file.
        let mut file = open_file(path)?;
        let mut reader = get_reader(file.stream()?, self.config.delimiter, self.config.quote_char)?;

        let header = read_header(&mut reader)
            .map_err(|e| LoadError::file_access(path, e.into()))?
            .ok_or_else(|| LoadError::header(path, "file is empty"))?;
        check_header(path, &header)?;
        debug!(path = %path.display(), columns = ?header.columns(), "header read");

        let mut batch = Batch::with_max_size(self.config.batch_size);
        for raw in reader {
            let raw = raw.map_err(|e| LoadError::file_access(path, e.into()))?;
            let Some(record) = format_record(&raw, false) else {
                continue;
            };
            batch.push(record);
            if batch.is_full() {
                self.flush(ctx, &header, &mut batch, stats)?;
            }
        }
        self.flush(ctx, &header, &mut batch, stats)
    }

    fn flush(
        &mut self,
        ctx: &FileContext,
        header: &HeaderRecord,
        batch: &mut Batch,
        stats: &mut FileStats,
    ) -> LoadResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.conn
            .execute_batch(&self.config.table, header.columns(), batch.rows())?;
        stats.batches += 1;
        stats.rows += batch.len() as u64;
        debug!(
            path = %ctx.path.display(),
            batch = stats.batches,
            rows = batch.len(),
            total_rows = stats.rows,
            "batch flushed"
        );
        if let Some(obs) = &self.observer {
            obs.on_batch_flushed(ctx, stats.batches, batch.len());
        }
        batch.clear();
        Ok(())
    }

    fn notify_failure(&self, ctx: &FileContext, e: &LoadError) {
        if let Some(obs) = &self.observer {
            let sev = e.severity();
            obs.on_failure(ctx, sev, e);
            if sev >= self.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

pub(crate) fn check_header(path: &Path, header: &HeaderRecord) -> LoadResult<()> {
    if header.is_empty() || header.columns().iter().all(|c| c.is_empty()) {
        return Err(LoadError::header(path, "header row has no column names"));
    }
    if let Some(i) = header.columns().iter().position(|c| c.is_empty()) {
        return Err(LoadError::header(path, format!("column {} has an empty name", i + 1)));
    }
    if let Some((i, col)) = header
        .columns()
        .iter()
        .enumerate()
        .find(|(_, c)| !is_plain_identifier(c))
    {
        return Err(LoadError::header(
            path,
            format!("column {} ('{col}') is not a plain identifier", i + 1),
        ));
    }
    if let Some(dup) = header.first_duplicate() {
        return Err(LoadError::header(path, format!("duplicate column name '{dup}'")));
    }
    Ok(())
}

/// Letters, digits, `_`, `$` and `#`: the characters every backend accepts in an unquoted name.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '#'))
}
