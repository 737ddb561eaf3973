//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one root and
//! collecting [`FileRecord`]s for duplicate detection. Traversal is
//! single-threaded and depth-first, with directory entries visited in
//! lexical order so repeated runs over the same tree produce the same
//! sequence.
//!
//! # Features
//!
//! - Recursive or single-level traversal
//! - Minimum size filtering
//! - Symbolic links are neither followed nor reported
//! - Per-entry error policy (abort or skip-and-log)
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupebridge::scanner::{ScanConfig, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), ScanConfig::new(true, 1));
//! let result = walker.scan(true).unwrap();
//! println!("{} files, {} skipped errors", result.records.len(), result.errors.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use walkdir::WalkDir;

use super::{FileRecord, ScanConfig, ScanError};

/// Directory walker for file discovery under a single root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk (absolute)
    root: PathBuf,
    /// Walker configuration
    config: ScanConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

/// Files collected from one root, plus the errors skipped along the way.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Matched files, in traversal order
    pub records: Vec<FileRecord>,
    /// Errors that were logged and skipped under the ignore-errors policy
    pub errors: Vec<ScanError>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// Relative roots are made absolute against the current directory so
    /// every emitted record carries an absolute path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: ScanConfig) -> Self {
        let root = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            root,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The absolute root this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Confirm the root exists and is a directory.
    fn check_root(&self) -> Result<(), ScanError> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Walk the directory tree, yielding file records lazily.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration; the caller decides whether each one is fatal. A missing
    /// or non-directory root yields a single error and nothing else.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let root_error = self.check_root().err();

        let entries = if root_error.is_none() {
            let mut walk_dir = WalkDir::new(&self.root)
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name();
            if !self.config.recursive {
                walk_dir = walk_dir.max_depth(1);
            }
            Some(walk_dir.into_iter())
        } else {
            None
        };

        root_error.map(Err).into_iter().chain(
            entries
                .into_iter()
                .flatten()
                .take_while(move |_| {
                    if self.is_shutdown_requested() {
                        log::debug!("Walker: Shutdown requested, stopping iteration");
                        false
                    } else {
                        true
                    }
                })
                .filter_map(move |entry| self.process_entry(entry)),
        )
    }

    /// Walk the tree and collect every record, applying the error policy.
    ///
    /// With `ignore_errors` set, each error is logged, kept in
    /// [`ScanResult::errors`] and the walk continues; otherwise the first
    /// error is returned. The policy is applied to each error on its own.
    ///
    /// # Errors
    ///
    /// - The first [`ScanError`] when `ignore_errors` is false
    /// - [`ScanError::Interrupted`] if shutdown was requested mid-walk
    pub fn scan(&self, ignore_errors: bool) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::default();

        for entry in self.walk() {
            match entry {
                Ok(record) => {
                    log::trace!("Matched {} ({} bytes)", record.path.display(), record.size);
                    result.records.push(record);
                }
                Err(e) if ignore_errors => {
                    log::warn!("Error encountered: {}; ignoring as requested", e);
                    result.errors.push(e);
                }
                Err(e) => return Err(e),
            }
        }

        if self.is_shutdown_requested() {
            return Err(ScanError::Interrupted);
        }

        log::debug!(
            "Scanned {}: {} files matched, {} errors skipped",
            self.root.display(),
            result.records.len(),
            result.errors.len()
        );
        Ok(result)
    }

    /// Turn one walkdir entry into a record, a skip, or an error.
    fn process_entry(
        &self,
        entry: walkdir::Result<walkdir::DirEntry>,
    ) -> Option<Result<FileRecord, ScanError>> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        let file_type = entry.file_type();

        // Skip directories (we only want files)
        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", entry.path().display());
            return None;
        }

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!(
                "Skipping file below size threshold ({} < {}): {}",
                size,
                self.config.min_size,
                entry.path().display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Some(Ok(FileRecord::new(entry.into_path(), size, modified)))
    }

    /// Convert walkdir errors into [`ScanError`].
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);

        let loop_message = error.to_string();
        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(&path, io_error),
            None => ScanError::Io {
                path,
                source: std::io::Error::other(loop_message),
            },
        }
    }
}
