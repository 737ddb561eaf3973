//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (first stage)
//! - Checksum-based regrouping (confirmation stage)
//! - Threshold pruning, shared by both stages
//! - Summary statistics over the confirmed sets

pub mod finder;
pub mod groups;
pub mod summary;

pub use finder::{update_checksums, DuplicateFinder, FinderConfig, FinderError, ScanOutcome};
pub use groups::{ChecksumIndex, FileIndex, SizeIndex};
pub use summary::{DuplicateSummary, SummaryError};
