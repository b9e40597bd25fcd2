//! Core data model types for loading.
//!
//! Rows travel through the loader as plain [`Record`]s (ordered lists of normalized strings).
//! The first record of a file becomes the [`HeaderRecord`], which names the target columns;
//! subsequent records are buffered into a [`Batch`] until it is flushed to the database.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConnectionError, LoadError, LoadResult};

/// An ordered sequence of trimmed, unquoted fields.
pub type Record = Vec<String>;

/// Canonical column names taken from the first record of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    columns: Vec<String>,
}

impl HeaderRecord {
    /// Wrap already-normalized column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the first column name that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<&str> {
        self.columns
            .iter()
            .enumerate()
            .find(|(i, c)| self.columns[..*i].contains(c))
            .map(|(_, c)| c.as_str())
    }
}

/// Bounded group of records awaiting a single batched insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    rows: Vec<Record>,
    max_size: usize,
}

impl Batch {
    /// Create an empty batch.
    ///
    /// # Panics
    ///
    /// Panics if `max_size == 0`.
    pub fn with_max_size(max_size: usize) -> Self {
        assert!(max_size > 0, "max_size must be > 0");
        Self {
            rows: Vec::with_capacity(max_size.min(4_096)),
            max_size,
        }
    }

    pub fn push(&mut self, record: Record) {
        debug_assert!(!self.is_full(), "push into a full batch");
        self.rows.push(record);
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.max_size
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum DbType {
    Oracle,
    MySql,
    Postgres,
    Db2,
}

impl DbType {
    pub const ALL: [DbType; 4] = [DbType::Oracle, DbType::MySql, DbType::Postgres, DbType::Db2];

    /// The string tag used to select this backend.
    pub fn tag(self) -> &'static str {
        match self {
            DbType::Oracle => "oracle",
            DbType::MySql => "mysql",
            DbType::Postgres => "postgres",
            DbType::Db2 => "db2",
        }
    }

    /// Well-known listener port of the backend.
    pub fn default_port(self) -> u16 {
        match self {
            DbType::Oracle => 1521,
            DbType::MySql => 3306,
            DbType::Postgres => 5432,
            DbType::Db2 => 50000,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DbType {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        DbType::ALL
            .into_iter()
            .find(|t| t.tag() == tag)
            .ok_or_else(|| ConnectionError::UnsupportedDatabase(s.to_string()))
    }
}

impl TryFrom<String> for DbType {
    type Error = ConnectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where and as whom to connect.
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    pub db_type: DbType,
    pub user: String,
    pub password: String,
    #[serde(default = "default_host")]
    pub host: String,
    /// If `None`, [`DbType::default_port`] is used.
    #[serde(default)]
    pub port: Option<u16>,
    pub db_name: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ConnectionConfig {
    pub fn new(
        db_type: DbType,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        db_name: impl Into<String>,
    ) -> Self {
        Self {
            db_type,
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port: None,
            db_name: db_name.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The configured port, or the backend's default.
    pub fn resolved_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.db_type.default_port())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("db_type", &self.db_type)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .finish()
    }
}

/// Options controlling how files are parsed and loaded.
///
/// Use [`Default`] for common cases; only `table` has no sensible default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field separator.
    pub delimiter: char,
    /// Quote character enclosing fields that contain the separator.
    pub quote_char: char,
    /// Maximum number of rows per batched insert.
    pub batch_size: usize,
    /// Target table name.
    pub table: String,
    /// Issue `TRUNCATE TABLE` before the first file is loaded.
    pub truncate: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            batch_size: 10_000,
            table: String::new(),
            truncate: false,
        }
    }
}

impl LoaderConfig {
    /// Defaults with the given target table.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON document; missing keys fall back to [`Default`].
    pub fn from_json_str(json: &str) -> LoadResult<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| LoadError::Config {
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> LoadResult<()> {
        let invalid = |message: String| Err(LoadError::Config { message });
        if self.batch_size == 0 {
            return invalid("batch_size must be > 0".to_string());
        }
        if self.table.trim().is_empty() {
            return invalid("table name must not be empty".to_string());
        }
        if !self.delimiter.is_ascii() {
            return invalid(format!("delimiter '{}' is not ASCII", self.delimiter));
        }
        if !self.quote_char.is_ascii() {
            return invalid(format!("quote character '{}' is not ASCII", self.quote_char));
        }
        if self.delimiter == self.quote_char {
            return invalid("delimiter and quote character must differ".to_string());
        }
        Ok(())
    }
}
