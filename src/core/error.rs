//! Error taxonomy for integrity operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, IntegrityError>;

/// Errors raised by the digest engine, scanner, baseline store and monitor
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// A file could not be opened or read while hashing
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Scan target is missing or not a directory
    #[error("{} is not a valid directory", .path.display())]
    InvalidDirectory { path: PathBuf },

    /// No baseline has been created yet
    #[error("baseline file {} not found; create a baseline first", .path.display())]
    NotFound { path: PathBuf },

    /// The persisted baseline is unreadable or malformed
    #[error("baseline file {} is corrupt: {reason}", .path.display())]
    CorruptBaseline { path: PathBuf, reason: String },

    /// The baseline could not be persisted
    #[error("cannot write baseline {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported hash algorithm '{0}' (expected sha224, sha256, sha384 or sha512)")]
    UnsupportedAlgorithm(String),

    /// Baseline digests were produced by a different algorithm than the configured one
    #[error("baseline digests do not match {expected}; baseline entry '{path}' has a {found}-character digest")]
    AlgorithmMismatch {
        expected: String,
        path: String,
        found: usize,
    },

    #[error("scan cancelled before completion")]
    Cancelled,
}

impl IntegrityError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptBaseline {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
