//! File actions module.
//!
//! This module provides functionality for:
//! - Re-verifying report rows against the filesystem
//! - Backup copies that mirror the original directory layout
//! - Permanent removal
//! - The prune pass tying these together
//!
//! ```no_run
//! use dupebridge::actions::{PruneEngine, PruneOptions};
//! use dupebridge::report::{read_report, ReadOptions};
//! use std::path::Path;
//!
//! let outcome = read_report(Path::new("duplicates.csv"), ReadOptions::default()).unwrap();
//! let options = PruneOptions {
//!     dry_run: true,
//!     ..PruneOptions::default()
//! };
//! let report = PruneEngine::new(options).run(outcome.rows).unwrap();
//! println!("{}", report.summary());
//! ```

pub mod backup;
pub mod prune;
pub mod remove;
pub mod verify;

// Re-export commonly used types
pub use backup::{backup_destination, backup_file, BackupError};
pub use prune::{
    PlannedAction, PruneAborted, PruneEngine, PruneError, PruneFailure, PruneOptions, PruneReport,
};
pub use remove::{remove_file, RemoveError, RemovedFile};
pub use verify::{verify_row, Rejection, VerifiedRow};
