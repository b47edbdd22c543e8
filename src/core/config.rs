//! Runtime configuration shared by the library and the CLI

use std::path::PathBuf;

use super::digest::HashAlgorithm;
use crate::baseline::store::DEFAULT_BASELINE_FILE;

/// Default location of the append-only integrity log
pub const DEFAULT_LOG_FILE: &str = "integrity_log.txt";

/// Where the baseline and log live and which digest to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityConfig {
    pub baseline_path: PathBuf,
    pub log_path: PathBuf,
    pub algorithm: HashAlgorithm,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            baseline_path: PathBuf::from(DEFAULT_BASELINE_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            algorithm: HashAlgorithm::Sha256,
        }
    }
}
