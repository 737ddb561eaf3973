//! Duplicate finder orchestrating the scan, size and checksum stages.
//!
//! # Pipeline
//!
//! 1. **Walk** - each root is walked on its own and folded into a partial
//!    [`SizeIndex`]; the partials are merged
//! 2. **Size pruning** - buckets below the duplicate threshold are dropped
//! 3. **Digest** - every surviving file gets a SHA-256 checksum
//! 4. **Regroup** - digested files are regrouped into a [`ChecksumIndex`]
//! 5. **Checksum pruning** - buckets below the threshold are dropped
//! 6. **Summary** - counts and wasted space are derived
//!
//! All stages run on the calling thread, one file at a time.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{ChecksumIndex, DuplicateSummary, SizeIndex, SummaryError};
use crate::scanner::{Checksum, HashError, ScanConfig, ScanError, Walker};

/// Inputs to a duplicate scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderConfig {
    /// Root directories to scan
    pub roots: Vec<PathBuf>,
    /// Walk options shared by every root
    pub scan: ScanConfig,
    /// Minimum members for a bucket to survive pruning
    pub duplicates_threshold: usize,
    /// Skip and log per-file errors instead of aborting
    pub ignore_errors: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            scan: ScanConfig::default(),
            duplicates_threshold: 2,
            ignore_errors: false,
        }
    }
}

impl FinderConfig {
    /// Create a configuration for the given roots with default options.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    /// Set the walk options.
    #[must_use]
    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Set the duplicate threshold.
    #[must_use]
    pub fn with_duplicates_threshold(mut self, threshold: usize) -> Self {
        self.duplicates_threshold = threshold;
        self
    }

    /// Set the per-file error policy.
    #[must_use]
    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }
}

/// Everything produced by a completed scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Size buckets after pruning
    pub size_index: SizeIndex,
    /// Confirmed duplicate sets
    pub checksum_index: ChecksumIndex,
    /// Aggregate counts
    pub summary: DuplicateSummary,
    /// Walk errors skipped under the ignore-errors policy
    pub scan_errors: Vec<ScanError>,
    /// Digest errors skipped under the ignore-errors policy
    pub hash_errors: Vec<HashError>,
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// No roots were supplied.
    #[error("No paths to scan")]
    NoRoots,

    /// Walking a root failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Digesting a file failed.
    #[error("Failed to generate checksum: {0}")]
    Hash(#[from] HashError),

    /// The pruned indexes were inconsistent.
    #[error("Internal consistency fault: {0}")]
    Summary(#[from] SummaryError),
}

/// Compute a checksum for every record in `index`, in place.
///
/// With `ignore_errors` set, records that cannot be digested are removed
/// from the index, logged, and returned, and the index is pruned again so
/// no bucket is left with fewer than `threshold` files. Otherwise the first
/// failure is returned and the index is left partly digested.
///
/// # Errors
///
/// Returns the first [`HashError`] when `ignore_errors` is false.
pub fn update_checksums(
    index: &mut SizeIndex,
    threshold: usize,
    ignore_errors: bool,
) -> Result<Vec<HashError>, HashError> {
    if !ignore_errors {
        for record in index.records_mut() {
            record.checksum = Some(Checksum::compute(&record.path)?);
        }
        return Ok(Vec::new());
    }

    let mut skipped = Vec::new();
    index.retain_records(|record| match Checksum::compute(&record.path) {
        Ok(checksum) => {
            record.checksum = Some(checksum);
            true
        }
        Err(e) => {
            log::warn!("Failed to generate checksum: {}; ignoring as requested", e);
            skipped.push(e);
            false
        }
    });
    if !skipped.is_empty() {
        let removed = index.prune(threshold);
        log::debug!(
            "Pruned {} size buckets left below {} members by skipped files",
            removed,
            threshold
        );
    }
    Ok(skipped)
}

/// Duplicate finder that runs the size-then-checksum pipeline.
///
/// # Example
///
/// ```no_run
/// use dupebridge::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::new(FinderConfig::new(vec![PathBuf::from(".")]));
/// let outcome = finder.find().unwrap();
///
/// println!("Found {} duplicate sets", outcome.summary.checksum_match_sets);
/// println!("Wasted space: {}", outcome.summary.wasted_space_display());
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
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

    /// Run the full pipeline over every configured root.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - No roots were configured
    /// - A walk or digest error occurs and errors are not ignored
    /// - The scan is interrupted by shutdown signal
    pub fn find(&self) -> Result<ScanOutcome, FinderError> {
        if self.config.roots.is_empty() {
            return Err(FinderError::NoRoots);
        }

        log::info!(
            "Evaluating {} path(s) (recursive: {}, minimum size: {} bytes)",
            self.config.roots.len(),
            self.config.scan.recursive,
            self.config.scan.min_size
        );

        // Walk every root into its own partial index, then merge
        let mut size_index = SizeIndex::new();
        let mut scan_errors = Vec::new();
        for root in &self.config.roots {
            let mut walker = Walker::new(root, self.config.scan.clone());
            if let Some(ref flag) = self.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }

            let result = walker.scan(self.config.ignore_errors).map_err(|e| match e {
                ScanError::Interrupted => FinderError::Interrupted,
                other => FinderError::Scan(other),
            })?;
            scan_errors.extend(result.errors);
            size_index.merge(SizeIndex::from_records(result.records));
        }

        let total_evaluated_files = size_index.total_files();
        log::info!("Files evaluated: {}", total_evaluated_files);

        let removed = size_index.prune(self.config.duplicates_threshold);
        log::info!(
            "Pruned {} size buckets below {} members; {} files in {} buckets remain",
            removed,
            self.config.duplicates_threshold,
            size_index.total_files(),
            size_index.len()
        );

        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Generating checksums for {} files", size_index.total_files());
        let hash_errors = update_checksums(
            &mut size_index,
            self.config.duplicates_threshold,
            self.config.ignore_errors,
        )?;

        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut checksum_index = ChecksumIndex::from_size_index(size_index.clone());
        let removed = checksum_index.prune(self.config.duplicates_threshold);
        log::info!(
            "Pruned {} checksum buckets; {} duplicate sets remain",
            removed,
            checksum_index.len()
        );

        let summary =
            DuplicateSummary::compute(total_evaluated_files, &size_index, &checksum_index)?;

        Ok(ScanOutcome {
            size_index,
            checksum_index,
            summary,
            scan_errors,
            hash_errors,
        })
    }
}
