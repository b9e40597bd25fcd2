//! File discovery.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{LoadError, LoadResult};

/// Suffix pattern used when a directory is given: plain and compressed CSVs alike.
pub const DIRECTORY_PATTERN: &str = "*.csv*";

/// Expand a path, directory or glob expression into a sorted list of files.
///
/// - A directory is rewritten to `dir/*.csv*` before matching.
/// - Anything else is matched as a glob expression as-is (a literal path matches itself).
/// - No match yields an empty list; callers decide whether that is fatal.
///
/// Only a syntactically invalid glob expression is an error.
pub fn find_all_files(pattern: &str) -> LoadResult<Vec<PathBuf>> {
    let pattern = if Path::new(pattern).is_dir() {
        Path::new(pattern)
            .join(DIRECTORY_PATTERN)
            .to_string_lossy()
            .into_owned()
    } else {
        pattern.to_string()
    };

    let entries = glob::glob(&pattern).map_err(|e| LoadError::Config {
        message: format!("invalid file pattern '{pattern}': {e}"),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            // Unreadable directory entries are not matches.
            Err(e) => warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable path"),
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_glob_is_a_config_error() {
        let err = find_all_files("data/[unterminated").unwrap_err();
        assert!(err.to_string().contains("invalid file pattern"));
    }

    #[test]
    fn missing_literal_path_yields_nothing() {
        let files = find_all_files("/definitely/not/here.csv").unwrap();
        assert!(files.is_empty());
    }
}
