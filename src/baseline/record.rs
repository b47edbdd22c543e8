//! Baseline data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use super::timestamp;
use crate::scanner::tree_scanner::ScanResult;

/// Recorded digest of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub hash: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub last_checked: DateTime<Utc>,
}

/// Snapshot of expected digests for a directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Absolute path of the scan root
    pub directory: PathBuf,
    /// Creation time
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Relative path -> record
    pub files: BTreeMap<String, FileRecord>,
}

impl Baseline {
    /// Build a baseline from a completed scan, stamping every record with `now`
    pub fn from_scan(directory: PathBuf, files: ScanResult, now: DateTime<Utc>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, hash)| {
                (
                    path,
                    FileRecord {
                        hash,
                        last_checked: now,
                    },
                )
            })
            .collect();

        Self {
            directory,
            timestamp: now,
            files,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Set `last_checked` of every record to `now`
    pub fn touch_all(&mut self, now: DateTime<Utc>) {
        for record in self.files.values_mut() {
            record.last_checked = now;
        }
    }

    /// Check structural invariants, returning a description of the first violation
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.directory.is_absolute() {
            return Err(format!(
                "directory '{}' is not an absolute path",
                self.directory.display()
            ));
        }
        for key in self.files.keys() {
            let path = Path::new(key);
            if key.is_empty()
                || path.is_absolute()
                || path
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(format!("'{}' is not a path relative to the scan root", key));
            }
        }
        Ok(())
    }
}
