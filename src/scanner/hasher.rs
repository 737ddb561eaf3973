//! SHA-256 file checksums with streaming support.
//!
//! # Overview
//!
//! [`Checksum`] is the content fingerprint recorded for every file in a
//! confirmed duplicate set. It is a distinct type rather than a bare string
//! so it can only be compared against other checksums, and it knows how to
//! [`verify`](Checksum::verify) itself against a file on disk.
//!
//! Files are read in fixed-size chunks, so memory use does not depend on
//! file size.
//!
//! # Example
//!
//! ```no_run
//! use dupebridge::scanner::Checksum;
//! use std::path::Path;
//!
//! let checksum = Checksum::compute(Path::new("photo.jpg")).unwrap();
//! println!("{}", checksum); // 64 lowercase hex characters
//! checksum.verify(Path::new("photo-copy.jpg")).unwrap();
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha2::{Digest, Sha256};

use super::HashError;

/// Read buffer size for streaming digests.
const BUFFER_SIZE: usize = 64 * 1024;

/// Number of hex characters in a rendered checksum.
pub const CHECKSUM_HEX_LEN: usize = 64;

/// SHA-256 digest of a file's full content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute the checksum of a file in a single streaming pass.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read completely.
    pub fn compute(path: &Path) -> Result<Self, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        Self::compute_from_reader(file).map_err(|e| HashError::from_io(path, e))
    }

    /// Compute the checksum of everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error.
    pub fn compute_from_reader<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, reader);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(Self(hasher.finalize().into()))
    }

    /// Confirm that the file at `path` still has this checksum.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Mismatch`] if the content changed
    /// - [`VerifyError::Hash`] if the file could not be read
    pub fn verify(&self, path: &Path) -> Result<(), VerifyError> {
        let actual = Self::compute(path)?;
        if actual != *self {
            log::debug!(
                "Checksum mismatch for {}: expected {}, got {}",
                path.display(),
                self,
                actual
            );
            return Err(VerifyError::Mismatch {
                path: path.to_path_buf(),
                expected: *self,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hash_to_hex(&self.0))
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", hash_to_hex(&self.0))
    }
}

impl FromStr for Checksum {
    type Err = ChecksumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_hash(s.trim()).map(Self)
    }
}

/// Failure to parse a checksum from its hex rendering.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecksumParseError {
    /// Wrong number of characters.
    #[error("expected 64 hex characters, got {0}")]
    InvalidLength(usize),

    /// A character outside `0-9a-fA-F`.
    #[error("invalid hex character {0:?}")]
    InvalidCharacter(char),
}

/// Failure to confirm a file against a recorded checksum.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    /// File content no longer matches.
    #[error("checksum mismatch for {path}, file likely modified; got {actual}, expected {expected}")]
    Mismatch {
        /// File that was checked
        path: PathBuf,
        /// Checksum recorded at scan time
        expected: Checksum,
        /// Checksum computed now
        actual: Checksum,
    },

    /// File could not be digested.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Render digest bytes as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &[u8; 32]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(CHECKSUM_HEX_LEN);
    for byte in hash {
        out.push(DIGITS[(byte >> 4) as usize] as char);
        out.push(DIGITS[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Parse a 64-character hex string (either case) into digest bytes.
///
/// # Errors
///
/// Returns [`ChecksumParseError`] for wrong length or non-hex characters.
pub fn hex_to_hash(hex: &str) -> Result<[u8; 32], ChecksumParseError> {
    let chars: Vec<char> = hex.chars().collect();
    if chars.len() != CHECKSUM_HEX_LEN {
        return Err(ChecksumParseError::InvalidLength(chars.len()));
    }

    let mut out = [0u8; 32];
    for (i, pair) in chars.chunks(2).enumerate() {
        let hi = pair[0]
            .to_digit(16)
            .ok_or(ChecksumParseError::InvalidCharacter(pair[0]))?;
        let lo = pair[1]
            .to_digit(16)
            .ok_or(ChecksumParseError::InvalidCharacter(pair[1]))?;
        out[i] = ((hi << 4) | lo) as u8;
    }
    Ok(out)
}
