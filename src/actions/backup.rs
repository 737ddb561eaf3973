//! Copying files under a backup root before they are removed.
//!
//! The copy keeps the file's original location: `/home/user/a.txt` backed
//! up to `/mnt/backup` lands at `/mnt/backup/home/user/a.txt`. On Windows
//! the drive or UNC prefix is dropped, so `C:\Users\a.txt` lands at
//! `<backup>\Users\a.txt`.
//!
//! An existing file at the destination is never overwritten.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

/// Errors from backing up a single file.
#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    /// The backup root does not exist.
    #[error("backup directory does not exist: {0}")]
    RootMissing(PathBuf),

    /// The backup root is not a directory.
    #[error("backup path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    /// Something already exists where the copy would go.
    #[error("backup destination already exists, refusing to overwrite: {0}")]
    DestinationExists(PathBuf),

    /// Copying, creating directories, or syncing failed.
    #[error("backup failed for {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where `source` would be copied under `backup_root`.
///
/// Relative sources are resolved against the current directory first.
/// Volume prefixes, the root separator, and `.` components are dropped and
/// `..` components are resolved lexically, so the result always lies
/// under `backup_root`.
///
/// # Errors
///
/// Fails only if the current directory is needed and cannot be read.
pub fn backup_destination(source: &Path, backup_root: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(source)?;
    let mut relative = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                relative.pop();
            }
            Component::Normal(part) => relative.push(part),
        }
    }
    Ok(backup_root.join(relative))
}

/// Copy `source` under `backup_root`, returning the destination path.
///
/// Missing intermediate directories are created. The copy is flushed and
/// synced before returning; a partial copy is removed on failure.
///
/// # Errors
///
/// - [`BackupError::RootMissing`] / [`BackupError::RootNotDirectory`]
/// - [`BackupError::DestinationExists`] if the destination is taken
/// - [`BackupError::Io`] for read, write, or sync failures
pub fn backup_file(source: &Path, backup_root: &Path) -> Result<PathBuf, BackupError> {
    match fs::metadata(backup_root) {
        Ok(m) if m.is_dir() => {}
        Ok(_) => return Err(BackupError::RootNotDirectory(backup_root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(BackupError::RootMissing(backup_root.to_path_buf()))
        }
        Err(e) => return Err(BackupError::io(backup_root, e)),
    }

    let destination =
        backup_destination(source, backup_root).map_err(|e| BackupError::io(source, e))?;
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| BackupError::io(parent, e))?;
    }

    let mut input = File::open(source).map_err(|e| BackupError::io(source, e))?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&destination)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => BackupError::DestinationExists(destination.clone()),
            _ => BackupError::io(&destination, e),
        })?;

    match copy_and_sync(&mut input, output) {
        Ok(bytes) => {
            log::info!(
                "Backed up {} to {} ({} bytes)",
                source.display(),
                destination.display(),
                bytes
            );
            Ok(destination)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&destination) {
                log::warn!(
                    "Could not remove partial backup {}: {}",
                    destination.display(),
                    cleanup
                );
            }
            Err(BackupError::io(&destination, e))
        }
    }
}

fn copy_and_sync(input: &mut File, output: File) -> io::Result<u64> {
    let mut writer = BufWriter::new(output);
    let bytes = io::copy(input, &mut writer)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    file.sync_all()?;
    Ok(bytes)
}
