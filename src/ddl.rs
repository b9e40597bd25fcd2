//! `CREATE TABLE` generation from file headers.
//!
//! Every column gets the same type; adjust the generated statement before applying it if the
//! data needs anything more specific.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{LoadError, LoadResult};
use crate::ingestion::{find_all_files, get_reader, open_file, read_header};
use crate::loader::check_header;
use crate::types::{HeaderRecord, LoaderConfig};

/// Column type used when none is given.
pub const DEFAULT_COLUMN_TYPE: &str = "VARCHAR(1000)";

/// Render a `CREATE TABLE` statement with one `column_type` column per header entry.
pub fn create_table_statement(table: &str, header: &HeaderRecord, column_type: &str) -> String {
    let columns: Vec<String> = header
        .columns()
        .iter()
        .map(|c| format!("  {c} {column_type}"))
        .collect();
    format!("CREATE TABLE {table}\n(\n{}\n);", columns.join(",\n"))
}

/// Table name derived from a file name: the part before the first `.`, upper-cased, with every
/// character that is not alphanumeric replaced by `_`.
pub fn table_name_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    stem.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Read the header of the first readable file matching `pattern` and render its table DDL.
///
/// `table` defaults to [`table_name_from_path`] of that file. Unreadable files are skipped.
/// Returns `Ok(None)` when no file yields a header.
pub fn generate_table_ddl(
    pattern: &str,
    table: Option<&str>,
    column_type: &str,
    config: &LoaderConfig,
) -> LoadResult<Option<String>> {
    for path in find_all_files(pattern)? {
        match header_of(&path, config) {
            Ok(header) => {
                let table = table
                    .map(str::to_owned)
                    .unwrap_or_else(|| table_name_from_path(&path));
                debug!(path = %path.display(), %table, "generating table DDL");
                return Ok(Some(create_table_statement(&table, &header, column_type)));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping file"),
        }
    }
    Ok(None)
}

fn header_of(path: &Path, config: &LoaderConfig) -> LoadResult<HeaderRecord> {
    let mut file = open_file(path)?;
    let mut reader = get_reader(file.stream()?, config.delimiter, config.quote_char)?;
    let header = read_header(&mut reader)
        .map_err(|e| LoadError::file_access(path, e.into()))?
        .ok_or_else(|| LoadError::header(path, "file has no header row"))?;
    check_header(path, &header)?;
    Ok(header)
}
