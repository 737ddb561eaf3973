//! Aggregate statistics for a completed scan.

use serde::Serialize;

use super::{ChecksumIndex, SizeIndex};

/// Counts and wasted space derived from the pruned indexes.
///
/// Computed once per scan and then only read, by the report writers and the
/// console summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateSummary {
    /// Files matched by the scan before any pruning
    pub total_evaluated_files: usize,
    /// Size buckets that survived pruning
    pub size_match_sets: usize,
    /// Checksum buckets that survived pruning (the duplicate sets)
    pub checksum_match_sets: usize,
    /// Files in surviving size buckets
    pub size_match_files: usize,
    /// Files in surviving checksum buckets
    pub checksum_match_files: usize,
    /// Files beyond one original per duplicate set
    pub duplicate_files: usize,
    /// Bytes that removing every duplicate would free
    pub wasted_space: u64,
}

/// Internal-consistency faults found while summarizing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// A duplicate set with no members survived pruning.
    #[error("duplicate set {checksum} has no members")]
    EmptySet {
        /// Checksum key of the empty set
        checksum: String,
    },
}

impl DuplicateSummary {
    /// Derive the summary from the pre-prune file count and both pruned indexes.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::EmptySet`] if a checksum bucket is empty.
    pub fn compute(
        total_evaluated_files: usize,
        size_index: &SizeIndex,
        checksum_index: &ChecksumIndex,
    ) -> Result<Self, SummaryError> {
        let mut duplicate_files = 0usize;
        let mut wasted_space = 0u64;

        for (checksum, records) in checksum_index.iter() {
            let Some(representative) = records.first() else {
                return Err(SummaryError::EmptySet {
                    checksum: checksum.to_string(),
                });
            };
            let extra = records.len() - 1;
            duplicate_files += extra;
            wasted_space += extra as u64 * representative.size;
        }

        Ok(Self {
            total_evaluated_files,
            size_match_sets: size_index.len(),
            checksum_match_sets: checksum_index.len(),
            size_match_files: size_index.total_files(),
            checksum_match_files: checksum_index.total_files(),
            duplicate_files,
            wasted_space,
        })
    }

    /// Wasted space formatted with IEC units.
    #[must_use]
    pub fn wasted_space_display(&self) -> String {
        bytesize::ByteSize::b(self.wasted_space).to_string()
    }
}
