use std::path::PathBuf;

use thiserror::Error;

use crate::ingestion::observability::LoadSeverity;

/// Convenience result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Boxed error produced by a database driver binding.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How far an error reaches: the current file only, or the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Log the failure, skip the file and carry on with the next one.
    SkipFile,
    /// Stop the run; no further statements are issued.
    AbortRun,
}

/// Error type returned by the loader.
///
/// Per-file variants ([`LoadError::FileAccess`], [`LoadError::Header`]) are recovered by
/// [`crate::loader::BatchLoader`]; the remaining variants end the run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File missing, unreadable, or a corrupt gzip/zip stream.
    #[error("cannot read file '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blank, empty or otherwise unusable header row.
    #[error("invalid header in '{}': {message}", path.display())]
    Header { path: PathBuf, message: String },

    /// The database connection could not be established.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A statement failed against the database.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The supplied configuration cannot be used.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl LoadError {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn header(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Header {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error only affects the file being processed.
    pub fn scope(&self) -> ErrorScope {
        match self {
            LoadError::FileAccess { .. } | LoadError::Header { .. } => ErrorScope::SkipFile,
            LoadError::Connection(_) | LoadError::Database(_) | LoadError::Config { .. } => {
                ErrorScope::AbortRun
            }
        }
    }

    /// Severity used for observer callbacks. A rejected header warns: none of that file reached
    /// the table.
    pub fn severity(&self) -> LoadSeverity {
        match self {
            LoadError::Header { .. } => LoadSeverity::Warning,
            LoadError::FileAccess { .. } => LoadSeverity::Error,
            LoadError::Connection(_) | LoadError::Database(_) | LoadError::Config { .. } => {
                LoadSeverity::Critical
            }
        }
    }
}

/// Failure to obtain a [`crate::db::DatabaseConnection`].
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("database type '{0}' is not supported")]
    UnsupportedDatabase(String),

    /// No driver binding is registered for the backend.
    #[error("no driver registered for {0}; register one before connecting")]
    DriverUnavailable(crate::types::DbType),

    /// The driver refused the connection (bad credentials, unreachable host, ...).
    #[error("{db_type} rejected connection to {target}: {source}")]
    Rejected {
        db_type: crate::types::DbType,
        target: String,
        #[source]
        source: DriverError,
    },
}

/// Failure while executing statements on an open connection.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("statement against table '{table}' failed: {source} (sql='{statement}')")]
    Driver {
        table: String,
        statement: String,
        #[source]
        source: DriverError,
    },

    #[error("commit failed: {0}")]
    Commit(#[source] DriverError),

    #[error("close failed: {0}")]
    Close(#[source] DriverError),

    #[error("connection is closed")]
    Closed,
}

/// Process outcome for callers that surface the run result as an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    GenericError = 1,
    // 2 is left to argument parsing in an outer CLI.
    DatabaseError = 3,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Classify the result of a run.
    pub fn from_result<T>(result: &LoadResult<T>) -> Self {
        match result {
            Ok(_) => ExitStatus::Success,
            Err(LoadError::Connection(_) | LoadError::Database(_)) => ExitStatus::DatabaseError,
            Err(_) => ExitStatus::GenericError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_file_errors_skip_the_file() {
        let err = LoadError::header("a.csv", "blank");
        assert_eq!(err.scope(), ErrorScope::SkipFile);
        assert_eq!(err.severity(), LoadSeverity::Warning);

        let err = LoadError::file_access("a.csv", std::io::Error::other("boom"));
        assert_eq!(err.scope(), ErrorScope::SkipFile);
        assert_eq!(err.severity(), LoadSeverity::Error);
    }

    #[test]
    fn database_errors_abort_and_map_to_exit_code_three() {
        let err: LoadError = DatabaseError::Closed.into();
        assert_eq!(err.scope(), ErrorScope::AbortRun);
        assert_eq!(err.severity(), LoadSeverity::Critical);

        let res: LoadResult<()> = Err(err);
        assert_eq!(ExitStatus::from_result(&res), ExitStatus::DatabaseError);
        assert_eq!(ExitStatus::from_result(&res).code(), 3);
    }

    #[test]
    fn exit_status_distinguishes_three_outcomes() {
        assert_eq!(ExitStatus::from_result(&Ok::<_, LoadError>(())).code(), 0);
        let res: LoadResult<()> = Err(LoadError::Config {
            message: "bad".to_string(),
        });
        assert_eq!(ExitStatus::from_result(&res).code(), 1);
    }
}
