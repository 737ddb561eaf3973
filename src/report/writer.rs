//! Writing duplicate sets to a CSV report.
//!
//! # Example
//!
//! ```no_run
//! use dupebridge::duplicates::{DuplicateFinder, FinderConfig};
//! use dupebridge::report::ReportWriter;
//! use std::path::{Path, PathBuf};
//!
//! let outcome = DuplicateFinder::new(FinderConfig::new(vec![PathBuf::from(".")]))
//!     .find()
//!     .unwrap();
//!
//! ReportWriter::new(&outcome.checksum_index)
//!     .with_blank_line_between_sets(true)
//!     .write_file(Path::new("duplicates.csv"))
//!     .unwrap();
//! ```

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{ReportError, COLUMN_COUNT, HEADER};
use crate::duplicates::ChecksumIndex;
use crate::scanner::FileRecord;

/// Placeholder written to the `remove_file` column.
const REMOVE_PLACEHOLDER: &str = "false";

/// CSV report writer over a pruned [`ChecksumIndex`].
#[derive(Debug)]
pub struct ReportWriter<'a> {
    index: &'a ChecksumIndex,
    blank_line_between_sets: bool,
}

impl<'a> ReportWriter<'a> {
    /// Create a writer for the given duplicate sets.
    #[must_use]
    pub fn new(index: &'a ChecksumIndex) -> Self {
        Self {
            index,
            blank_line_between_sets: false,
        }
    }

    /// Separate duplicate sets with an all-empty row.
    #[must_use]
    pub fn with_blank_line_between_sets(mut self, enabled: bool) -> Self {
        self.blank_line_between_sets = enabled;
        self
    }

    /// Write the header and one row per file to `writer`.
    ///
    /// Files whose directory or name is not valid UTF-8 are skipped with a
    /// warning, since their rows could never be matched on prune.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Csv` if encoding or writing fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(HEADER)?;

        for (set_number, (checksum, records)) in self.index.iter().enumerate() {
            if self.blank_line_between_sets && set_number > 0 {
                csv_writer.write_record([""; COLUMN_COUNT])?;
            }

            let checksum = checksum.to_string();
            for record in records {
                let Some((directory, file_name)) = utf8_location(record) else {
                    log::warn!(
                        "Skipping {}: path is not valid UTF-8",
                        record.path.display()
                    );
                    continue;
                };
                let size_in_bytes = record.size.to_string();
                let size_hr = record.size_hr();
                csv_writer.write_record([
                    directory,
                    file_name,
                    size_hr.as_str(),
                    size_in_bytes.as_str(),
                    checksum.as_str(),
                    REMOVE_PLACEHOLDER,
                ])?;
            }
        }

        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Generate the report as a string.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if encoding fails.
    pub fn to_string(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the report to `path`, replacing any existing file only on success.
    ///
    /// The parent directory must already exist. Rows are written to a
    /// temporary file beside the target, flushed and synced, and then
    /// renamed over `path`, so a failed write never leaves a truncated report.
    ///
    /// # Errors
    ///
    /// - [`ReportError::MissingParent`] if the parent directory is missing
    /// - [`ReportError::Io`] if the file cannot be created, synced, or renamed
    pub fn write_file(&self, path: &Path) -> Result<(), ReportError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(ReportError::MissingParent(parent));
        }

        let io_error = |source: io::Error| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&parent).map_err(io_error)?;
        self.write_to(&mut temp)?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(path).map_err(|e| io_error(e.error))?;

        log::info!(
            "Wrote {} rows in {} sets to {}",
            self.index.total_files(),
            self.index.len(),
            path.display()
        );
        Ok(())
    }
}

/// Directory and file name of `record`, or `None` if either is not UTF-8.
fn utf8_location(record: &FileRecord) -> Option<(&str, &str)> {
    let directory = record.parent.to_str()?;
    let file_name = record.path.file_name().and_then(OsStr::to_str)?;
    Some((directory, file_name))
}
