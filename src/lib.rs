//! `csv-db-loader` bulk-loads delimited text files into a relational database table.
//!
//! The pipeline is strictly sequential:
//!
//! 1. [`ingestion::find_all_files`] expands a path, directory or glob into a sorted file list
//! 2. [`ingestion::open_file`] opens each file through its compression layer and
//!    [`ingestion::DataFile::stream`] yields its decompressed bytes
//! 3. [`ingestion::get_reader`] splits the stream into records using the configured separator
//!    and quote character
//! 4. [`ingestion::format_record`] normalizes the header (upper-case, spaces → `_`) and rows
//!    (unquoted, trimmed)
//! 5. [`loader::BatchLoader`] buffers rows and inserts them in batches through a
//!    [`db::DatabaseConnection`]
//!
//! ## Input files
//!
//! - `.csv` (plain text)
//! - `.csv.gz` (gzip)
//! - `.csv.zip` (only the archive's **first** entry is read)
//!
//! A directory argument is expanded to `dir/*.csv*`.
//!
//! ## Backends
//!
//! Oracle, MySQL, Postgres and DB2 are selected by [`types::DbType`]. Statements are rendered by
//! each backend's [`db::dialect::Dialect`]; the client library itself plugs in as a
//! [`db::Driver`] registered in a [`db::DriverRegistry`]. [`db::ScriptDriver`] writes the
//! statements to any writer instead of a live database.
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//!
//! use csv_db_loader::db::{connect, Driver, DriverRegistry, ScriptDriver};
//! use csv_db_loader::loader::BatchLoader;
//! use csv_db_loader::types::{ConnectionConfig, DbType, LoaderConfig};
//! use csv_db_loader::{ExitStatus, LoadError};
//!
//! # fn main() -> Result<(), LoadError> {
//! let registry = DriverRegistry::new().with(DbType::Postgres, |_cfg, _target| {
//!     Ok(Box::new(ScriptDriver::new(File::create("load.sql")?)) as Box<dyn Driver>)
//! });
//! let cfg = ConnectionConfig::new(DbType::Postgres, "loader", "secret", "localhost", "sales");
//! let mut conn = connect(&cfg, &registry)?;
//!
//! let result = BatchLoader::new(&mut *conn, LoaderConfig::for_table("orders"))?
//!     .load_pattern("data/");
//! match &result {
//!     Ok(report) => println!("rows={} skipped_files={}", report.rows_loaded(), report.files_skipped()),
//!     Err(e) => eprintln!("load failed: {e}"),
//! }
//! conn.commit()?;
//! conn.close()?;
//! std::process::exit(ExitStatus::from_result(&result).code());
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: file discovery, decompression, record parsing, normalization, observers
//! - [`loader`]: the batching orchestrator
//! - [`db`]: connection capability, dialects, driver registry
//! - [`ddl`]: `CREATE TABLE` generation from a file header
//! - [`types`]: records, batches and configuration
//! - [`error`]: error taxonomy and exit status mapping

pub mod db;
pub mod ddl;
pub mod error;
pub mod ingestion;
pub mod loader;
pub mod types;

pub use error::{ErrorScope, ExitStatus, LoadError, LoadResult};
