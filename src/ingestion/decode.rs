//! Opening files through zero or one decompression layer.
//!
//! The layer is chosen by file name suffix:
//!
//! - `.zip`: the archive's **first** entry is read; any further entries are ignored.
//! - `.gz`: gzip stream.
//! - anything else: plain text.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::bufread::MultiGzDecoder;
use zip::ZipArchive;

use crate::error::{LoadError, LoadResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression layer of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zip,
}

impl Compression {
    /// Select the layer from the file name suffix (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            Some("zip") => Self::Zip,
            Some("gz") => Self::Gzip,
            _ => Self::None,
        }
    }
}

enum Source {
    Plain(BufReader<File>),
    Gzip(MultiGzDecoder<BufReader<File>>),
    Zip(ZipArchive<BufReader<File>>),
}

/// An opened input file. Its text is read through [`DataFile::stream`].
///
/// The underlying handle is released when the value is dropped.
pub struct DataFile {
    path: PathBuf,
    compression: Compression,
    source: Source,
}

impl DataFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Decompressed byte stream of the file.
    ///
    /// Zip entries are checked against their stored CRC-32 when the end of the entry is reached;
    /// a mismatch surfaces as a read error.
    pub fn stream(&mut self) -> LoadResult<Box<dyn Read + '_>> {
        let Self { path, source, .. } = self;
        match source {
            Source::Plain(r) => Ok(Box::new(r)),
            Source::Gzip(r) => Ok(Box::new(r)),
            Source::Zip(archive) => match archive.by_index(0) {
                Ok(entry) => Ok(Box::new(entry)),
                Err(e) => Err(LoadError::file_access(path.as_path(), e.into())),
            },
        }
    }
}

impl std::fmt::Debug for DataFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFile")
            .field("path", &self.path)
            .field("compression", &self.compression)
            .finish()
    }
}

/// Open `path`, transparently decompressing `.gz` and `.zip` inputs.
///
/// Fails with [`LoadError::FileAccess`] when the file cannot be opened or the archive is not
/// readable. Corruption further into a compressed stream surfaces as an I/O error while reading.
pub fn open_file(path: impl AsRef<Path>) -> LoadResult<DataFile> {
    let path = path.as_ref();
    let compression = Compression::from_path(path);
    let source = open_source(path, compression).map_err(|e| LoadError::file_access(path, e))?;
    Ok(DataFile {
        path: path.to_path_buf(),
        compression,
        source,
    })
}

fn open_source(path: &Path, compression: Compression) -> io::Result<Source> {
    let mut file = File::open(path)?;
    match compression {
        Compression::None => Ok(Source::Plain(BufReader::new(file))),
        Compression::Gzip => {
            let mut magic = [0u8; 2];
            file.read_exact(&mut magic)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "not a gzip stream"))?;
            if magic != GZIP_MAGIC {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "not a gzip stream"));
            }
            file.seek(SeekFrom::Start(0))?;
            Ok(Source::Gzip(MultiGzDecoder::new(BufReader::new(file))))
        }
        Compression::Zip => {
            let mut archive = ZipArchive::new(BufReader::new(file))?;
            if archive.len() == 0 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "zip archive has no entries"));
            }
            let entry = archive.by_index_raw(0)?;
            if entry.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("first zip entry '{}' is a directory", entry.name()),
                ));
            }
            drop(entry);
            Ok(Source::Zip(archive))
        }
    }
}
