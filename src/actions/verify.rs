//! Re-checking report rows against the live filesystem.
//!
//! A row is accepted only after its directory exists, its file exists as a
//! regular file, and the file's current content still hashes to the
//! checksum recorded in the report. Size fields left blank in the report
//! are filled in from a fresh stat once the checksum has been confirmed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::report::ReportRow;
use crate::scanner::{Checksum, VerifyError};

/// A row that passed every check and may be acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRow {
    /// The row, with size fields backfilled
    pub row: ReportRow,
    /// Full path of the verified file
    pub path: PathBuf,
}

impl VerifiedRow {
    /// Whether the user marked this file for removal.
    #[must_use]
    pub fn remove(&self) -> bool {
        self.row.remove
    }
}

/// Why a row was not accepted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The recorded directory is gone or is not a directory.
    #[error("row {row}: directory {path} does not exist")]
    MissingDirectory {
        /// Report line
        row: u64,
        /// Directory from the report
        path: PathBuf,
    },

    /// The recorded file is gone.
    #[error("row {row}: file {path} does not exist")]
    MissingFile {
        /// Report line
        row: u64,
        /// File from the report
        path: PathBuf,
    },

    /// The recorded path is not a regular file.
    #[error("row {row}: {path} is not a regular file")]
    NotAFile {
        /// Report line
        row: u64,
        /// Path from the report
        path: PathBuf,
    },

    /// The file content changed since the report was written.
    #[error("row {row}: checksum mismatch for {path}, file likely modified; got {actual}, expected {expected}")]
    ChecksumMismatch {
        /// Report line
        row: u64,
        /// File that was checked
        path: PathBuf,
        /// Checksum in the report
        expected: Checksum,
        /// Checksum of the file now
        actual: Checksum,
    },

    /// The file or directory could not be inspected or read.
    #[error("row {row}: cannot read {path}: {message}")]
    Unreadable {
        /// Report line
        row: u64,
        /// Path that failed
        path: PathBuf,
        /// Underlying error text
        message: String,
    },
}

impl Rejection {
    /// Report line of the rejected row.
    #[must_use]
    pub fn row(&self) -> u64 {
        match self {
            Self::MissingDirectory { row, .. }
            | Self::MissingFile { row, .. }
            | Self::NotAFile { row, .. }
            | Self::ChecksumMismatch { row, .. }
            | Self::Unreadable { row, .. } => *row,
        }
    }

    /// Whether the file exists but its content no longer matches.
    #[must_use]
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    fn unreadable(row: u64, path: &Path, error: &dyn std::fmt::Display) -> Self {
        Self::Unreadable {
            row,
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

/// Run every check on `row`, in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the [`Rejection`] for the first check that fails.
pub fn verify_row(mut row: ReportRow) -> Result<VerifiedRow, Rejection> {
    let line = row.line;

    match fs::metadata(&row.directory) {
        Ok(m) if m.is_dir() => {}
        Ok(_) => {
            return Err(Rejection::MissingDirectory {
                row: line,
                path: row.directory,
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Rejection::MissingDirectory {
                row: line,
                path: row.directory,
            })
        }
        Err(e) => return Err(Rejection::unreadable(line, &row.directory, &e)),
    }

    let path = row.path();
    let metadata = match fs::symlink_metadata(&path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(Rejection::NotAFile { row: line, path }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Rejection::MissingFile { row: line, path })
        }
        Err(e) => return Err(Rejection::unreadable(line, &path, &e)),
    };

    match row.checksum.verify(&path) {
        Ok(()) => {}
        Err(VerifyError::Mismatch {
            expected, actual, ..
        }) => {
            return Err(Rejection::ChecksumMismatch {
                row: line,
                path,
                expected,
                actual,
            })
        }
        Err(VerifyError::Hash(e)) => return Err(Rejection::unreadable(line, &path, &e)),
    }

    if row.size_in_bytes.is_none() {
        log::debug!("Row {}: filling in size from disk", line);
        row.size_in_bytes = Some(metadata.len());
    }
    if row.size_hr.is_empty() {
        row.size_hr = bytesize::ByteSize::b(metadata.len()).to_string();
    }

    Ok(VerifiedRow { row, path })
}
