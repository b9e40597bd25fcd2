//! Reading side of the pipeline: discovery, decompression, record parsing and normalization.
//!
//! - [`locate`]: expand a path/directory/glob into the files to load
//! - [`decode`]: open a file through its gzip or zip layer
//! - [`csv`]: split the character stream into records and normalize fields
//! - [`observability`]: observer hooks for load outcomes

pub mod csv;
pub mod decode;
pub mod locate;
pub mod observability;

pub use self::csv::{format_record, get_reader, read_header, RowReader};
pub use decode::{open_file, Compression, DataFile};
pub use locate::find_all_files;
pub use observability::{
    CompositeObserver, FileContext, FileObserver, FileStats, LoadObserver, LoadSeverity, TracingObserver,
};
