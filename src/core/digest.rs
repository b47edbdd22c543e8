//! Streamed file hashing with the SHA-2 family

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use super::error::{IntegrityError, Result};

/// Read size used when feeding a file into the digest
pub const CHUNK_SIZE: usize = 4096;

/// Digest algorithm used for baselines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest this algorithm produces
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha224 => 56,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(IntegrityError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Compute the hex digest of a file
///
/// # Arguments
/// * `path` - Path to the file
/// * `algorithm` - Digest algorithm to apply
///
/// # Returns
/// Lower-case hex digest, or `IntegrityError::Read` if the file cannot be
/// opened or read
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Sha224 => stream_digest::<Sha224>(path),
        HashAlgorithm::Sha256 => stream_digest::<Sha256>(path),
        HashAlgorithm::Sha384 => stream_digest::<Sha384>(path),
        HashAlgorithm::Sha512 => stream_digest::<Sha512>(path),
    }
}

fn stream_digest<D: Digest>(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| IntegrityError::read(path, e))?;
    let mut hasher = D::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| IntegrityError::read(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}
