//! Permanent removal of a single file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for removal operations.
#[derive(thiserror::Error, Debug)]
pub enum RemoveError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to remove.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// General I/O error.
    #[error("failed to remove {path}: {source}")]
    Io {
        /// File being removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl RemoveError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// A file that was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedFile {
    /// Path that was removed
    pub path: PathBuf,
    /// Size of the removed file in bytes
    pub size: u64,
}

/// Permanently remove the file at `path`.
///
/// # Errors
///
/// Returns `RemoveError` if the file cannot be inspected or removed.
///
/// # Example
///
/// ```no_run
/// use dupebridge::actions::remove::remove_file;
/// use std::path::Path;
///
/// match remove_file(Path::new("/path/to/copy.txt")) {
///     Ok(removed) => println!("Removed {} ({} bytes)", removed.path.display(), removed.size),
///     Err(e) => eprintln!("Failed: {}", e),
/// }
/// ```
pub fn remove_file(path: &Path) -> Result<RemovedFile, RemoveError> {
    let size = fs::metadata(path)
        .map_err(|e| RemoveError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Removal failed for {}: {}", path.display(), e);
        RemoveError::from_io(path, e)
    })?;

    log::info!("Removed: {} ({} bytes)", path.display(), size);

    Ok(RemovedFile {
        path: path.to_path_buf(),
        size,
    })
}
