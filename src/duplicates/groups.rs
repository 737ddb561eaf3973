//! Keyed file grouping for the two detection stages.
//!
//! # Overview
//!
//! A [`FileIndex`] maps a key to the ordered list of [`FileRecord`]s that
//! share it. The same structure is used twice:
//!
//! - [`SizeIndex`] groups scanned files by exact byte size. Files with
//!   different sizes cannot be duplicates, so this is a cheap filter.
//! - [`ChecksumIndex`] regroups the digested survivors by content checksum.
//!   After pruning, this is the authoritative set of duplicate sets.
//!
//! Buckets are kept in a `BTreeMap`, so iteration visits keys in ascending
//! order and report output is reproducible without a separate sort.
//!
//! # Example
//!
//! ```
//! use dupebridge::scanner::FileRecord;
//! use dupebridge::duplicates::SizeIndex;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! let mut index = SizeIndex::from_records(files);
//! assert_eq!(index.total_files(), 3);
//!
//! // Drop buckets with fewer than two members
//! let removed = index.prune(2);
//! assert_eq!(removed, 1);
//! assert_eq!(index.len(), 1);
//! ```

use std::collections::btree_map::{self, BTreeMap};

use crate::scanner::{Checksum, FileRecord};

/// Files grouped by a shared key, in insertion order within each bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIndex<K: Ord> {
    buckets: BTreeMap<K, Vec<FileRecord>>,
}

/// Files grouped by exact byte size.
pub type SizeIndex = FileIndex<u64>;

/// Files grouped by content checksum.
pub type ChecksumIndex = FileIndex<Checksum>;

impl<K: Ord> Default for FileIndex<K> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }
}

impl<K: Ord> FileIndex<K> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the bucket for `key`.
    pub fn insert(&mut self, key: K, record: FileRecord) {
        self.buckets.entry(key).or_default().push(record);
    }

    /// Fold another index into this one.
    ///
    /// Buckets with the same key are concatenated. Bucket membership does not
    /// depend on merge order; only the order of records inside a bucket does.
    pub fn merge(&mut self, other: Self) {
        for (key, records) in other.buckets {
            match self.buckets.entry(key) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(records);
                }
                btree_map::Entry::Occupied(mut slot) => slot.get_mut().extend(records),
            }
        }
    }

    /// Remove every bucket with fewer than `threshold` members.
    ///
    /// Returns the number of buckets removed. A threshold below 2 is a
    /// configuration error caught before this is called; here it simply
    /// keeps every non-empty bucket.
    pub fn prune(&mut self, threshold: usize) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, records| records.len() >= threshold);
        before - self.buckets.len()
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the index holds no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of records across all buckets.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Records stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&[FileRecord]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Iterate buckets in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[FileRecord])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Iterate every record, bucket by bucket.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.buckets.values().flatten()
    }

    /// Mutable access to every record, bucket by bucket.
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut FileRecord> {
        self.buckets.values_mut().flatten()
    }

    /// Keep only the records for which `keep` returns true.
    ///
    /// Buckets emptied by this are removed. Returns the number of records
    /// dropped.
    pub fn retain_records<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&mut FileRecord) -> bool,
    {
        let before = self.total_files();
        for records in self.buckets.values_mut() {
            records.retain_mut(|r| keep(r));
        }
        self.buckets.retain(|_, records| !records.is_empty());
        before - self.total_files()
    }

    /// Consume the index, yielding `(key, records)` in ascending key order.
    pub fn into_buckets(self) -> impl Iterator<Item = (K, Vec<FileRecord>)> {
        self.buckets.into_iter()
    }
}

#[cfg(test)]
impl<K: Ord> FileIndex<K> {
    /// Add a bucket with no records, which the public API never produces.
    pub(crate) fn insert_empty_bucket(&mut self, key: K) {
        self.buckets.entry(key).or_default();
    }
}

impl SizeIndex {
    /// Group records by exact byte size.
    #[must_use]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let mut index = Self::new();
        for record in records {
            index.insert(record.size, record);
        }
        index
    }
}

impl ChecksumIndex {
    /// Regroup digested records by checksum, ignoring their size bucket.
    ///
    /// Records without a checksum cannot be placed in a checksum index; they
    /// are logged and left out.
    #[must_use]
    pub fn from_size_index(size_index: SizeIndex) -> Self {
        let mut index = Self::new();
        for (_, records) in size_index.into_buckets() {
            for record in records {
                match record.checksum {
                    Some(checksum) => index.insert(checksum, record),
                    None => log::error!(
                        "Record for {} reached checksum grouping without a checksum; skipping",
                        record.path.display()
                    ),
                }
            }
        }
        index
    }
}
