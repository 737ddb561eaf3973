//! The prune pass: verify every report row, then back up and remove the
//! files the user flagged.
//!
//! # Phases
//!
//! 1. **Verify** - each row goes through [`verify_row`]. A rejected row is
//!    never acted on. With `ignore_errors` unset the first rejection ends
//!    the run; with it set, the row is logged and skipped.
//! 2. **Act** - accepted rows with `remove_file` set are processed one at a
//!    time: backup first (when configured), then removal. A failed backup
//!    leaves the original in place.
//!
//! A dry run stops after computing what phase 2 would do.
//!
//! The tally is logged when the pass ends, including when it is cut short.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::backup::{backup_destination, backup_file, BackupError};
use super::remove::{remove_file, RemoveError, RemovedFile};
use super::verify::{verify_row, Rejection, VerifiedRow};
use crate::report::ReportRow;

/// Options for a prune pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOptions {
    /// Copy each file here before removing it
    pub backup_dir: Option<PathBuf>,
    /// Report intended actions without touching the filesystem
    pub dry_run: bool,
    /// Skip and log per-row failures instead of stopping
    pub ignore_errors: bool,
}

/// What a dry run would do with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    /// File that would be removed
    pub path: PathBuf,
    /// Where the backup copy would go, if backups are enabled
    pub backup_destination: Option<PathBuf>,
}

/// A file whose backup or removal failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneFailure {
    /// File being processed
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

/// Tally of a prune pass, complete or cut short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Rows handed to the engine
    pub rows_total: usize,
    /// Rows that passed verification
    pub accepted: usize,
    /// Rows that failed verification
    pub rejected: Vec<Rejection>,
    /// Accepted rows flagged for removal
    pub selected: usize,
    /// Actions a dry run would take
    pub planned: Vec<PlannedAction>,
    /// Backup copies written
    pub backed_up: Vec<PathBuf>,
    /// Files removed
    pub removed: Vec<RemovedFile>,
    /// Files whose backup or removal failed
    pub failures: Vec<PruneFailure>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl PruneReport {
    /// One-line tally for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let rows = format!(
            "Rows: {} total, {} accepted, {} rejected",
            self.rows_total,
            self.accepted,
            self.rejected.len()
        );
        if self.dry_run {
            format!(
                "{}. Dry run: {} of {} marked files would be removed",
                rows,
                self.planned.len(),
                self.selected
            )
        } else {
            format!(
                "{}. File removal: {} success, {} fail",
                rows,
                self.removed.len(),
                self.failures.len()
            )
        }
    }

    /// Bytes freed by the removals.
    #[must_use]
    pub fn freed_bytes(&self) -> u64 {
        self.removed.iter().map(|r| r.size).sum()
    }
}

/// Why a prune pass stopped early.
#[derive(thiserror::Error, Debug)]
pub enum PruneError {
    /// A row failed verification and errors are not ignored.
    #[error("validation failed: {0}")]
    Rejected(#[from] Rejection),

    /// A backup copy failed and errors are not ignored.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// A removal failed and errors are not ignored.
    #[error(transparent)]
    Remove(#[from] RemoveError),

    /// The pass was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Prune interrupted by user")]
    Interrupted,
}

/// A prune pass that stopped early, with everything done up to that point.
#[derive(thiserror::Error, Debug)]
#[error("{source}")]
pub struct PruneAborted {
    /// Tally up to the failure
    pub report: Box<PruneReport>,
    /// The failure
    pub source: PruneError,
}

/// Runs prune passes over parsed report rows.
#[derive(Debug)]
pub struct PruneEngine {
    options: PruneOptions,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl PruneEngine {
    /// Create an engine with the given options.
    #[must_use]
    pub fn new(options: PruneOptions) -> Self {
        Self {
            options,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag; the pass stops before the next file once set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Verify `rows` and act on the flagged ones.
    ///
    /// Returns the tally on success, including when nothing was flagged.
    ///
    /// # Errors
    ///
    /// Returns [`PruneAborted`] carrying the partial tally when a row is
    /// rejected, a backup or removal fails (both only when errors are not
    /// ignored), or shutdown is requested.
    pub fn run(&self, rows: Vec<ReportRow>) -> Result<PruneReport, PruneAborted> {
        let mut report = PruneReport {
            rows_total: rows.len(),
            dry_run: self.options.dry_run,
            ..PruneReport::default()
        };

        let accepted = match self.verify_all(rows, &mut report) {
            Ok(accepted) => accepted,
            Err(e) => return Err(abort(report, e)),
        };
        report.accepted = accepted.len();

        let selected: Vec<VerifiedRow> =
            accepted.into_iter().filter(VerifiedRow::remove).collect();
        report.selected = selected.len();

        if selected.is_empty() {
            log::info!(
                "0 entries out of {} marked for removal. Nothing to do.",
                report.accepted
            );
            log_tally(&report);
            return Ok(report);
        }

        if self.options.dry_run {
            for row in selected {
                match self.plan(row.path) {
                    Ok(action) => report.planned.push(action),
                    Err((path, e)) => {
                        if let Some(aborted) = self.record_failure(&mut report, path, e) {
                            return Err(abort(report, aborted));
                        }
                    }
                }
            }
            log_tally(&report);
            return Ok(report);
        }

        for row in selected {
            if self.is_shutdown_requested() {
                return Err(abort(report, PruneError::Interrupted));
            }
            if let Err(e) = self.prune_file(&row.path, &mut report) {
                if let Some(aborted) = self.record_failure(&mut report, row.path, e) {
                    return Err(abort(report, aborted));
                }
            }
        }

        log_tally(&report);
        Ok(report)
    }

    /// Phase 1: verify every row, collecting the accepted ones.
    fn verify_all(
        &self,
        rows: Vec<ReportRow>,
        report: &mut PruneReport,
    ) -> Result<Vec<VerifiedRow>, PruneError> {
        let mut accepted = Vec::with_capacity(rows.len());
        for row in rows {
            if self.is_shutdown_requested() {
                return Err(PruneError::Interrupted);
            }
            match verify_row(row) {
                Ok(verified) => accepted.push(verified),
                Err(rejection) => {
                    report.rejected.push(rejection.clone());
                    if !self.options.ignore_errors {
                        log::error!("{}", rejection);
                        return Err(PruneError::Rejected(rejection));
                    }
                    log::warn!("{}; ignoring as requested", rejection);
                }
            }
        }
        Ok(accepted)
    }

    /// What a dry run reports for one file.
    fn plan(&self, path: PathBuf) -> Result<PlannedAction, (PathBuf, PruneError)> {
        let backup_destination = match self.options.backup_dir {
            Some(ref root) => match backup_destination(&path, root) {
                Ok(destination) => Some(destination),
                Err(e) => {
                    let error = BackupError::Io {
                        path: path.clone(),
                        source: e,
                    };
                    return Err((path, error.into()));
                }
            },
            None => None,
        };

        match backup_destination {
            Some(ref destination) => log::info!(
                "Dry run: would back up {} to {} and remove it",
                path.display(),
                destination.display()
            ),
            None => log::info!("Dry run: would remove {}", path.display()),
        }

        Ok(PlannedAction {
            path,
            backup_destination,
        })
    }

    /// Phase 2 for one file: back up if configured, then remove.
    fn prune_file(&self, path: &Path, report: &mut PruneReport) -> Result<(), PruneError> {
        if let Some(ref root) = self.options.backup_dir {
            let destination = backup_file(path, root)?;
            report.backed_up.push(destination);
        }
        let removed = remove_file(path)?;
        report.removed.push(removed);
        Ok(())
    }

    /// Record a per-file failure; returns the error if the pass must stop.
    fn record_failure(
        &self,
        report: &mut PruneReport,
        path: PathBuf,
        error: PruneError,
    ) -> Option<PruneError> {
        report.failures.push(PruneFailure {
            path,
            message: error.to_string(),
        });
        if self.options.ignore_errors {
            log::warn!("{}; ignoring as requested", error);
            None
        } else {
            log::error!("{}", error);
            Some(error)
        }
    }
}

fn log_tally(report: &PruneReport) {
    log::info!("{}", report.summary());
}

fn abort(report: PruneReport, source: PruneError) -> PruneAborted {
    log_tally(&report);
    PruneAborted {
        report: Box::new(report),
        source,
    }
}
