//! Finding candidate files and fingerprinting them.
//!
//! - [`walker`] lists regular files under a root, in lexical order
//! - [`hasher`] defines [`Checksum`], the SHA-256 fingerprint of a file
//!
//! # Example
//!
//! ```no_run
//! use dupebridge::scanner::{ScanConfig, Walker};
//! use std::path::Path;
//!
//! let config = ScanConfig {
//!     recursive: true,
//!     min_size: 1024, // Skip files under 1KiB
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Checksum, ChecksumParseError, VerifyError};
pub use walker::{ScanResult, Walker};

/// One file matched by a scan.
///
/// The checksum stays `None` until the checksum stage fills it in; records
/// are regrouped between indexes but never dropped silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Directory containing the file
    pub parent: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Content checksum, once computed
    pub checksum: Option<Checksum>,
}

impl FileRecord {
    /// Create a new record with an unset checksum.
    ///
    /// The parent directory is derived from `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            parent,
            size,
            modified,
            checksum: None,
        }
    }

    /// File name component as displayed in reports.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Human-readable size (IEC units).
    #[must_use]
    pub fn size_hr(&self) -> String {
        bytesize::ByteSize::b(self.size).to_string()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanConfig {
    /// Descend into subdirectories instead of reading only the root.
    pub recursive: bool,

    /// Minimum file size to include (in bytes).
    /// Files strictly smaller than this are skipped.
    pub min_size: u64,
}

impl ScanConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(recursive: bool, min_size: u64) -> Self {
        Self {
            recursive,
            min_size,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Scan was stopped by a shutdown request.
    #[error("Scan interrupted")]
    Interrupted,

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Build a scan error from an I/O error, keeping the common kinds distinct.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Build a hash error from an I/O error.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
