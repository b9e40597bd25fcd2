//! Delimited record reading and field normalization.

use std::io::Read;

use crate::error::{LoadError, LoadResult};
use crate::types::{HeaderRecord, Record};

/// Forward-only reader yielding raw records (ordered field lists).
///
/// Quoting honors the configured quote character; records may have differing field counts.
/// Reaching the end of input ends the iteration.
pub struct RowReader<R> {
    inner: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: Read> RowReader<R> {
    /// 1-based line number of the most recently read record.
    pub fn line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<Vec<String>, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.record.iter().map(str::to_owned).collect())),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Wrap a character stream in a delimited-record reader.
///
/// The first row is not treated specially; use [`read_header`] to consume it.
/// Fails with [`LoadError::Config`] unless `delimiter` and `quote_char` are single-byte ASCII.
pub fn get_reader<R: Read>(stream: R, delimiter: char, quote_char: char) -> LoadResult<RowReader<R>> {
    let inner = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(ascii_byte("delimiter", delimiter)?)
        .quote(ascii_byte("quote character", quote_char)?)
        .from_reader(stream);
    Ok(RowReader {
        inner,
        record: csv::StringRecord::new(),
    })
}

fn ascii_byte(what: &str, c: char) -> LoadResult<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| LoadError::Config {
            message: format!("{what} '{c}' is not ASCII"),
        })
}

/// Normalize a raw record.
///
/// Returns `None` for an empty record (a blank line), which callers skip. Otherwise every field
/// has double quotes removed and surrounding whitespace trimmed; with `header == true` the value
/// is additionally upper-cased and inner spaces become underscores, yielding column names.
pub fn format_record<S: AsRef<str>>(fields: &[S], header: bool) -> Option<Record> {
    if fields.is_empty() {
        return None;
    }
    let out = fields
        .iter()
        .map(|f| {
            let val = f.as_ref().replace('"', "");
            let val = val.trim();
            if header {
                val.replace(' ', "_").to_uppercase()
            } else {
                val.to_owned()
            }
        })
        .collect();
    Some(out)
}

/// Consume the first record of `reader` as the header.
///
/// Returns `Ok(None)` when the input has no records at all.
pub fn read_header<R: Read>(reader: &mut RowReader<R>) -> Result<Option<HeaderRecord>, csv::Error> {
    match reader.next() {
        None => Ok(None),
        Some(raw) => Ok(format_record(&raw?, true).map(HeaderRecord::new)),
    }
}
