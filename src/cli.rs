//! Command-line surface of DupeBridge.
//!
//! One subcommand per pass: `report` writes the CSV, `prune` acts on it.
//! Flags that apply to both (verbosity, color, config file) are global.
//!
//! # Example
//!
//! ```bash
//! # Scan two directories recursively and write a report
//! dupebridge report --path ~/Pictures --path /mnt/backup/Pictures --recurse \
//!     --csv-file duplicates.csv
//!
//! # Only consider files of 1MB or more
//! dupebridge report --path ~/Downloads --size 1MB --csv-file big.csv
//!
//! # After editing remove_file in the report, preview and then prune
//! dupebridge prune --input-csv duplicates.csv --dry-run
//! dupebridge prune --input-csv duplicates.csv --backup-dir /mnt/keep
//!
//! # Verbose mode for debugging
//! dupebridge -v report --path . --csv-file out.csv
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Duplicate file finder with a review-then-prune workflow.
///
/// DupeBridge scans directories for files with identical content and writes
/// them to a CSV report. Mark the copies to remove in the report's
/// `remove_file` column, then run `prune` to verify and remove them.
#[derive(Debug, Parser)]
#[command(name = "dupebridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for DupeBridge.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories and write a CSV report of duplicate sets
    Report(ReportArgs),
    /// Verify a reviewed report and remove the files marked for removal
    Prune(PruneArgs),
}

/// Arguments for the report subcommand.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Directory to scan (repeat for several)
    #[arg(short, long = "path", value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Where to write the CSV report
    #[arg(long, value_name = "FILE")]
    pub csv_file: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long, overrides_with = "no_recurse")]
    pub recurse: bool,

    /// Stay in the given directories, even if the config enables recursion
    #[arg(long, overrides_with = "recurse")]
    pub no_recurse: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(short, long, value_name = "SIZE", value_parser = parse_size)]
    pub size: Option<u64>,

    /// Number of identical files needed to form a duplicate set (at least 2)
    #[arg(short, long, value_name = "N")]
    pub duplicates: Option<usize>,

    /// Log and skip unreadable files instead of stopping
    #[arg(long, overrides_with = "no_ignore_errors")]
    pub ignore_errors: bool,

    /// Stop on the first unreadable file, even if the config says otherwise
    #[arg(long, overrides_with = "ignore_errors")]
    pub no_ignore_errors: bool,

    /// Separate duplicate sets with a blank line
    #[arg(long, overrides_with = "no_blank_line")]
    pub blank_line: bool,

    /// Write sets without separator rows
    #[arg(long, overrides_with = "blank_line")]
    pub no_blank_line: bool,

    /// Also print the duplicate sets to the terminal
    #[arg(long, overrides_with = "no_console")]
    pub console: bool,

    /// Print only the summary
    #[arg(long, overrides_with = "console")]
    pub no_console: bool,
}

/// Arguments for the prune subcommand.
#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Report previously written by `report` and edited by you
    #[arg(short, long, value_name = "FILE")]
    pub input_csv: PathBuf,

    /// Copy each file here, under its original path, before removing it
    #[arg(short, long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Show what would be removed without changing anything
    #[arg(long, overrides_with = "no_dry_run")]
    pub dry_run: bool,

    /// Remove files, even if the config enables dry runs
    #[arg(long, overrides_with = "dry_run")]
    pub no_dry_run: bool,

    /// Log and skip failing rows instead of stopping
    #[arg(long, overrides_with = "no_ignore_errors")]
    pub ignore_errors: bool,

    /// Stop on the first failing row, even if the config says otherwise
    #[arg(long, overrides_with = "ignore_errors")]
    pub no_ignore_errors: bool,

    /// The report has no header row; treat the first row as data
    #[arg(long, overrides_with = "no_use_first_row")]
    pub use_first_row: bool,

    /// The report's first row is a header
    #[arg(long, overrides_with = "use_first_row")]
    pub no_use_first_row: bool,

    /// Separate duplicate sets with a blank line in console output
    #[arg(long, overrides_with = "no_blank_line")]
    pub blank_line: bool,

    /// Print report rows without separator lines
    #[arg(long, overrides_with = "blank_line")]
    pub no_blank_line: bool,

    /// Also print the report rows to the terminal
    #[arg(long, overrides_with = "no_console")]
    pub console: bool,

    /// Do not print the report rows
    #[arg(long, overrides_with = "console")]
    pub no_console: bool,
}

/// Size suffixes accepted by `--size`, upper-cased, with their multipliers.
const SIZE_UNITS: &[(&str, u64)] = &[
    ("", 1),
    ("B", 1),
    ("K", 1_000),
    ("KB", 1_000),
    ("KIB", 1 << 10),
    ("M", 1_000_000),
    ("MB", 1_000_000),
    ("MIB", 1 << 20),
    ("G", 1_000_000_000),
    ("GB", 1_000_000_000),
    ("GIB", 1 << 30),
    ("T", 1_000_000_000_000),
    ("TB", 1_000_000_000_000),
    ("TIB", 1 << 40),
];

/// Turn `--size` input such as `4096`, `1.5MB` or `2 GiB` into bytes.
///
/// Decimal (`KB`) and binary (`KiB`) suffixes are both accepted, in any case.
///
/// ```
/// use dupebridge::cli::parse_size;
///
/// assert_eq!(parse_size("512").unwrap(), 512);
/// assert_eq!(parse_size("4k").unwrap(), 4_000);
/// assert_eq!(parse_size("2 MiB").unwrap(), 2 * 1024 * 1024);
/// ```
///
/// # Errors
///
/// Returns a message for clap if the number or the suffix is not recognised.
pub fn parse_size(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let split = input
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(input.len(), |(i, _)| i);
    let (number, unit) = input.split_at(split);

    if number.is_empty() {
        return Err(format!("'{input}' does not start with a number"));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| format!("'{number}' is not a valid number"))?;

    let unit = unit.trim().to_ascii_uppercase();
    let multiplier = SIZE_UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|&(_, m)| m)
        .ok_or_else(|| format!("unknown size unit '{unit}' (use B, KB, KiB, MB, MiB, GB, GiB, TB or TiB)"))?;

    Ok((value * multiplier as f64).round() as u64)
}
