//! The CSV report that bridges the scan and prune phases.
//!
//! A report lists every file of every confirmed duplicate set, one row per
//! file, in six fixed columns:
//!
//! | column          | content                                   |
//! |-----------------|-------------------------------------------|
//! | `directory`     | parent directory of the file              |
//! | `file`          | file name                                 |
//! | `size`          | human-readable size (may be blank)        |
//! | `size_in_bytes` | exact size (may be blank)                 |
//! | `checksum`      | SHA-256 digest recorded at scan time      |
//! | `remove_file`   | removal decision, edited by the user      |
//!
//! Sets may be separated by a row of six empty fields. The writer lives in
//! [`writer`], the parser in [`reader`], and the terminal rendering used by
//! `--console` in [`console`].

pub mod console;
pub mod reader;
pub mod writer;

use std::path::PathBuf;

use crate::scanner::{Checksum, ChecksumParseError};

pub use reader::{read_report, read_report_from, ReadOptions, ReadOutcome};
pub use writer::ReportWriter;

/// Report column names, in file order.
pub const HEADER: [&str; 6] = [
    "directory",
    "file",
    "size",
    "size_in_bytes",
    "checksum",
    "remove_file",
];

/// Number of columns every non-blank row must have.
pub const COLUMN_COUNT: usize = HEADER.len();

/// One parsed row of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// 1-based line in the report, counting the header
    pub line: u64,
    /// Parent directory of the file
    pub directory: PathBuf,
    /// File name
    pub file: String,
    /// Human-readable size, possibly blank
    pub size_hr: String,
    /// Exact size; `None` when blank or zero in the report
    pub size_in_bytes: Option<u64>,
    /// Checksum recorded at scan time
    pub checksum: Checksum,
    /// Whether the user marked this file for removal
    pub remove: bool,
}

impl ReportRow {
    /// Full path of the referenced file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file)
    }
}

/// What was wrong with a single report row.
#[derive(thiserror::Error, Debug)]
pub enum RowErrorKind {
    /// The row did not have exactly six fields.
    #[error("expected 6 fields, found {found}")]
    FieldCount {
        /// Number of fields present
        found: usize,
    },

    /// A required field was blank.
    #[error("required field {0} is empty")]
    MissingField(&'static str),

    /// The size field was not a whole number.
    #[error("size_in_bytes {0:?} is not a whole number")]
    InvalidSize(String),

    /// The checksum field could not be parsed.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(#[from] ChecksumParseError),

    /// The removal flag was not a recognized boolean.
    #[error("remove_file {0:?} is not true or false")]
    InvalidFlag(String),

    /// The row could not be decoded at all.
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// A report row that failed to parse, with enough context to find it.
#[derive(thiserror::Error, Debug)]
#[error("row {row}: {kind}")]
pub struct RowError {
    /// 1-based line in the report
    pub row: u64,
    /// The problem found
    pub kind: RowErrorKind,
}

/// Errors from reading or writing a report file.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The directory that should hold the report does not exist.
    #[error("output directory does not exist: {0}")]
    MissingParent(PathBuf),

    /// The report file could not be opened, written, or synced.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The CSV encoder failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row failed to parse and errors are not ignored.
    #[error(transparent)]
    Row(#[from] RowError),
}
