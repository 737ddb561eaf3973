//! Terminal rendering of scan and prune results.
//!
//! Everything here writes to a caller-supplied [`Write`] so output can be
//! captured in tests; `run_app` passes stdout. Colors come from `yansi` and
//! are switched off globally by `--no-color`.

use std::io::{self, Write};
use std::path::Path;

use yansi::Paint;

use super::ReportRow;
use crate::actions::PruneReport;
use crate::duplicates::{ChecksumIndex, DuplicateSummary};

/// One table line before padding.
struct TableRow {
    directory: String,
    file: String,
    size: String,
    checksum: String,
    remove: Option<bool>,
}

/// Print the scan summary block.
///
/// # Errors
///
/// Propagates write failures.
pub fn print_summary<W: Write>(out: &mut W, summary: &DuplicateSummary) -> io::Result<()> {
    let lines = [
        ("Evaluated files", summary.total_evaluated_files.to_string()),
        ("Sets of files with identical size", summary.size_match_sets.to_string()),
        ("Files with identical size", summary.size_match_files.to_string()),
        (
            "Sets of files with identical checksum",
            summary.checksum_match_sets.to_string(),
        ),
        (
            "Files with identical checksum",
            summary.checksum_match_files.to_string(),
        ),
        ("Duplicate files", summary.duplicate_files.to_string()),
        ("Wasted space for duplicate files", summary.wasted_space_display()),
    ];
    let width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    writeln!(out)?;
    writeln!(out, "{}", "Duplicate summary".bold().underline())?;
    for (label, value) in lines {
        writeln!(out, "  {:<width$}  {}", label, value.bold())?;
    }
    Ok(())
}

/// Print every duplicate set as an aligned table.
///
/// # Errors
///
/// Propagates write failures.
pub fn print_duplicate_sets<W: Write>(
    out: &mut W,
    index: &ChecksumIndex,
    blank_line_between_sets: bool,
) -> io::Result<()> {
    let mut sets = Vec::with_capacity(index.len());
    for (checksum, records) in index.iter() {
        let checksum = checksum.to_string();
        sets.push(
            records
                .iter()
                .map(|record| TableRow {
                    directory: record.parent.display().to_string(),
                    file: record.file_name(),
                    size: record.size_hr(),
                    checksum: checksum.clone(),
                    remove: None,
                })
                .collect::<Vec<_>>(),
        );
    }
    print_table(out, &sets, blank_line_between_sets)
}

/// Print rows read back from a report, grouped by checksum.
///
/// # Errors
///
/// Propagates write failures.
pub fn print_report_rows<W: Write>(
    out: &mut W,
    rows: &[ReportRow],
    blank_line_between_sets: bool,
) -> io::Result<()> {
    let mut sets: Vec<Vec<TableRow>> = Vec::new();
    let mut last_checksum = None;
    for row in rows {
        if last_checksum != Some(row.checksum) {
            sets.push(Vec::new());
            last_checksum = Some(row.checksum);
        }
        if let Some(set) = sets.last_mut() {
            set.push(TableRow {
                directory: row.directory.display().to_string(),
                file: row.file.clone(),
                size: row.size_hr.clone(),
                checksum: row.checksum.to_string(),
                remove: Some(row.remove),
            });
        }
    }
    print_table(out, &sets, blank_line_between_sets)
}

fn print_table<W: Write>(
    out: &mut W,
    sets: &[Vec<TableRow>],
    blank_line_between_sets: bool,
) -> io::Result<()> {
    let rows = || sets.iter().flatten();
    let dir_w = rows().map(|r| r.directory.len()).max().unwrap_or(0).max(9);
    let file_w = rows().map(|r| r.file.len()).max().unwrap_or(0).max(4);
    let size_w = rows().map(|r| r.size.len()).max().unwrap_or(0).max(4);
    let with_remove = rows().any(|r| r.remove.is_some());

    writeln!(out)?;
    let mut header = format!(
        "{:<dir_w$}  {:<file_w$}  {:<size_w$}  {:<64}",
        "Directory", "File", "Size", "Checksum"
    );
    if with_remove {
        header.push_str("  Remove");
    }
    writeln!(out, "{}", header.trim_end().bold())?;

    for (i, set) in sets.iter().enumerate() {
        if blank_line_between_sets && i > 0 {
            writeln!(out)?;
        }
        for row in set {
            write!(
                out,
                "{}  {:<file_w$}  {:<size_w$}  {}",
                format!("{:<dir_w$}", row.directory).cyan(),
                row.file,
                row.size,
                row.checksum.dim()
            )?;
            match row.remove {
                Some(true) => writeln!(out, "  {}", "true".red().bold())?,
                Some(false) => writeln!(out, "  false")?,
                None => writeln!(out)?,
            }
        }
    }
    Ok(())
}

/// Print guidance after a report has been written.
///
/// # Errors
///
/// Propagates write failures.
pub fn print_report_next_steps<W: Write>(
    out: &mut W,
    report_path: &Path,
    summary: &DuplicateSummary,
) -> io::Result<()> {
    writeln!(out)?;
    if summary.checksum_match_sets == 0 {
        writeln!(out, "{}", "No duplicate files found.".green())?;
        return Ok(());
    }
    writeln!(out, "{}", "Next steps".bold().underline())?;
    writeln!(out, "  1. Open {} and review each set", report_path.display())?;
    writeln!(
        out,
        "  2. Set remove_file to true for every copy you want removed"
    )?;
    writeln!(
        out,
        "  3. Run: dupebridge prune --input-csv {} --dry-run",
        report_path.display()
    )?;
    writeln!(
        out,
        "  4. Repeat without --dry-run (add --backup-dir DIR to keep copies)"
    )?;
    Ok(())
}

/// List the rows flagged for removal, before anything is verified or touched.
///
/// # Errors
///
/// Propagates write failures.
pub fn print_marked_files<W: Write>(out: &mut W, rows: &[ReportRow]) -> io::Result<()> {
    let marked: Vec<&ReportRow> = rows.iter().filter(|row| row.remove).collect();

    writeln!(out)?;
    if marked.is_empty() {
        writeln!(out, "No files are marked for removal.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{}",
        format!("Files marked for removal ({})", marked.len())
            .bold()
            .underline()
    )?;
    for row in marked {
        writeln!(out, "  {}", row.path().display().red())?;
    }
    Ok(())
}

/// Print the prune tally.
///
/// # Errors
///
/// Propagates write failures.
pub fn print_prune_report<W: Write>(out: &mut W, report: &PruneReport) -> io::Result<()> {
    writeln!(out)?;
    if report.dry_run {
        writeln!(out, "{}", "Dry run: no files were changed".yellow().bold())?;
        for action in &report.planned {
            match action.backup_destination {
                Some(ref destination) => writeln!(
                    out,
                    "  would back up {} to {} and remove it",
                    action.path.display(),
                    destination.display()
                )?,
                None => writeln!(out, "  would remove {}", action.path.display())?,
            }
        }
    }
    writeln!(out, "{}", report.summary().bold())?;
    Ok(())
}
