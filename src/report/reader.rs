//! Parsing a (possibly hand-edited) CSV report back into rows.
//!
//! Every field is trimmed before it is checked. Rows whose fields are all
//! empty are treated as set separators and skipped. Any other row must have
//! exactly six fields; the directory, file, and checksum fields are
//! required, while both size fields and the removal flag may be blank.
//!
//! Whether a referenced directory or file still exists is not checked here.
//! That belongs to verification in [`crate::actions::verify`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{ReportError, ReportRow, RowError, RowErrorKind, COLUMN_COUNT};
use crate::scanner::Checksum;

/// How a report should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Treat the first row as data instead of a header
    pub use_first_row: bool,
    /// Skip and log malformed rows instead of aborting
    pub ignore_errors: bool,
}

/// Rows read from a report, plus the rows that were skipped.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    /// Parsed rows, in file order
    pub rows: Vec<ReportRow>,
    /// Malformed rows skipped under the ignore-errors policy
    pub skipped: Vec<RowError>,
    /// All-empty separator rows passed over
    pub blank_rows: usize,
}

/// Read and parse the report at `path`.
///
/// # Errors
///
/// - [`ReportError::Io`] if the file cannot be opened
/// - [`ReportError::Row`] for the first malformed row, unless ignored
pub fn read_report(path: &Path, options: ReadOptions) -> Result<ReadOutcome, ReportError> {
    let file = File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let outcome = read_report_from(file, options)?;
    log::info!(
        "Read {} rows from {} ({} skipped)",
        outcome.rows.len(),
        path.display(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

/// Parse a report from any reader.
///
/// # Errors
///
/// Returns [`ReportError::Row`] for the first malformed row, unless
/// `options.ignore_errors` is set.
pub fn read_report_from<R: Read>(
    reader: R,
    options: ReadOptions,
) -> Result<ReadOutcome, ReportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut outcome = ReadOutcome::default();

    for (index, result) in csv_reader.records().enumerate() {
        let fallback_line = index as u64 + 1;
        let parsed = match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, csv::Position::line);
                if index == 0 && !options.use_first_row {
                    log::debug!("Skipping header row");
                    continue;
                }
                if is_blank_row(&record) {
                    outcome.blank_rows += 1;
                    continue;
                }
                parse_row(line, &record)
            }
            Err(e) => Err(RowError {
                row: e.position().map_or(fallback_line, csv::Position::line),
                kind: RowErrorKind::Malformed(e.to_string()),
            }),
        };

        match parsed {
            Ok(row) => outcome.rows.push(row),
            Err(e) if options.ignore_errors => {
                log::warn!("Skipping {}; ignoring as requested", e);
                outcome.skipped.push(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(outcome)
}

/// Parse one non-blank record.
fn parse_row(line: u64, record: &csv::StringRecord) -> Result<ReportRow, RowError> {
    let fail = |kind| RowError { row: line, kind };

    if record.len() != COLUMN_COUNT {
        return Err(fail(RowErrorKind::FieldCount {
            found: record.len(),
        }));
    }

    let field = |i: usize| record.get(i).unwrap_or_default();
    let required = |i: usize, name: &'static str| {
        let value = field(i);
        if value.is_empty() {
            Err(fail(RowErrorKind::MissingField(name)))
        } else {
            Ok(value)
        }
    };

    let directory = PathBuf::from(required(0, "directory")?);
    let file = required(1, "file")?.to_string();
    let size_hr = field(2).to_string();

    let size_in_bytes = match field(3) {
        "" => None,
        raw => match raw.parse::<u64>() {
            Ok(0) => None,
            Ok(n) => Some(n),
            Err(_) => return Err(fail(RowErrorKind::InvalidSize(raw.to_string()))),
        },
    };

    let checksum = required(4, "checksum")?
        .parse::<Checksum>()
        .map_err(|e| fail(RowErrorKind::InvalidChecksum(e)))?;

    let remove = parse_flag(field(5))
        .ok_or_else(|| fail(RowErrorKind::InvalidFlag(field(5).to_string())))?;

    Ok(ReportRow {
        line,
        directory,
        file,
        size_hr,
        size_in_bytes,
        checksum,
        remove,
    })
}

/// A set separator: all six fields empty, or a whitespace-only line.
///
/// Empty rows with any other field count fall through to the field-count check.
fn is_blank_row(record: &csv::StringRecord) -> bool {
    (record.len() == COLUMN_COUNT || record.len() == 1) && record.iter().all(str::is_empty)
}

/// Interpret a removal flag; blank means "keep".
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "0" | "f" | "false" | "n" | "no" => Some(false),
        "1" | "t" | "true" | "y" | "yes" => Some(true),
        _ => None,
    }
}
