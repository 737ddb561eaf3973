//! DupeBridge - duplicate file finder with a review-then-prune workflow.
//!
//! `report` scans directories, groups files by size and then by SHA-256
//! checksum, and writes every duplicate set to a CSV report. The user marks
//! copies in the report's `remove_file` column; `prune` re-verifies each row
//! against the filesystem and removes the marked files, optionally backing
//! them up first.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod report;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};

use anyhow::Context;

use crate::actions::{PruneAborted, PruneEngine};
use crate::cli::{Cli, Commands, PruneArgs, ReportArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::report::{console, read_report, ReportWriter};
use crate::signal::ShutdownHandler;

/// Run one CLI invocation.
///
/// Shared by the binary and the integration tests.
///
/// # Errors
///
/// Returns any fatal error; use [`ExitCode::for_error`] to map it to an
/// exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color {
        yansi::disable();
    }

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Report(ref args) => run_report(&config, args, &handler, cli.quiet),
        Commands::Prune(ref args) => run_prune(&config, args, &handler, cli.quiet),
    }
}

fn run_report(
    config: &Config,
    args: &ReportArgs,
    handler: &ShutdownHandler,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let settings = config.report_settings(args)?;
    log::info!(
        "Scanning {} path(s), recursive: {}, minimum size: {} bytes",
        settings.paths.len(),
        settings.recursive,
        settings.min_size
    );

    let outcome = DuplicateFinder::new(settings.finder_config())
        .with_shutdown_flag(handler.get_flag())
        .find()?;

    let mut stdout = io::stdout().lock();
    if !quiet {
        console::print_summary(&mut stdout, &outcome.summary)?;
        if settings.console_report {
            console::print_duplicate_sets(
                &mut stdout,
                &outcome.checksum_index,
                settings.blank_line_between_sets,
            )?;
        }
    }

    ReportWriter::new(&outcome.checksum_index)
        .with_blank_line_between_sets(settings.blank_line_between_sets)
        .write_file(&settings.output_csv)
        .with_context(|| format!("Failed to write {}", settings.output_csv.display()))?;
    log::info!(
        "Wrote {} duplicate set(s) to {}",
        outcome.checksum_index.len(),
        settings.output_csv.display()
    );

    if !quiet {
        console::print_report_next_steps(&mut stdout, &settings.output_csv, &outcome.summary)?;
    }
    stdout.flush()?;

    Ok(ExitCode::Success)
}

fn run_prune(
    config: &Config,
    args: &PruneArgs,
    handler: &ShutdownHandler,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let settings = config.prune_settings(args)?;

    let outcome = read_report(&settings.input_csv, settings.read_options())
        .with_context(|| format!("Failed to read {}", settings.input_csv.display()))?;

    let mut stdout = io::stdout().lock();
    if !quiet {
        if settings.console_report {
            console::print_report_rows(
                &mut stdout,
                &outcome.rows,
                settings.blank_line_between_sets,
            )?;
        }
        console::print_marked_files(&mut stdout, &outcome.rows)?;
    }

    let result = PruneEngine::new(settings.prune_options())
        .with_shutdown_flag(handler.get_flag())
        .run(outcome.rows);

    match result {
        Ok(report) => {
            if !quiet {
                console::print_prune_report(&mut stdout, &report)?;
            }
            stdout.flush()?;
            Ok(ExitCode::Success)
        }
        Err(aborted) => {
            if !quiet {
                print_partial_tally(&mut stdout, &aborted)?;
            }
            stdout.flush()?;
            Err(aborted.into())
        }
    }
}

fn print_partial_tally<W: Write>(out: &mut W, aborted: &PruneAborted) -> io::Result<()> {
    console::print_prune_report(out, &aborted.report)?;
    writeln!(out, "Stopped early: {}", aborted.source)
}
