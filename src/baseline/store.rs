//! Baseline persistence: load, atomic save, create

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::record::Baseline;
use crate::core::error::{IntegrityError, Result};
use crate::scanner::tree_scanner::{SkippedEntry, TreeScanner};

/// Default baseline location, relative to the working directory
pub const DEFAULT_BASELINE_FILE: &str = "file_baseline.json";

/// Outcome of creating a baseline
#[derive(Debug, Clone)]
pub struct CreatedBaseline {
    pub baseline: Baseline,
    pub skipped: Vec<SkippedEntry>,
}

impl CreatedBaseline {
    /// Number of files successfully baselined
    pub fn file_count(&self) -> usize {
        self.baseline.file_count()
    }
}

/// Reads and writes the baseline record at a fixed path
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl Default for BaselineStore {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_FILE)
    }
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Scan `root` and persist the result as the new baseline
    ///
    /// Any prior baseline at this location is replaced. Nothing is written
    /// if `root` is invalid or the scan is cancelled.
    pub fn create(
        &self,
        root: &Path,
        scanner: &TreeScanner,
        now: DateTime<Utc>,
    ) -> Result<CreatedBaseline> {
        if !root.is_dir() {
            return Err(IntegrityError::InvalidDirectory {
                path: root.to_path_buf(),
            });
        }
        let directory = root
            .canonicalize()
            .map_err(|_| IntegrityError::InvalidDirectory {
                path: root.to_path_buf(),
            })?;

        info!(directory = %directory.display(), "creating baseline");
        let scan = scanner.scan(&directory)?;
        let baseline = Baseline::from_scan(directory, scan.files, now);
        self.save(&baseline)?;

        info!(
            files = baseline.file_count(),
            skipped = scan.skipped.len(),
            path = %self.path.display(),
            "baseline saved"
        );
        Ok(CreatedBaseline {
            baseline,
            skipped: scan.skipped,
        })
    }

    /// Load the persisted baseline
    ///
    /// # Returns
    /// `NotFound` if no baseline exists, `CorruptBaseline` if it cannot be
    /// read or parsed or violates path invariants
    pub fn load(&self) -> Result<Baseline> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IntegrityError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(IntegrityError::corrupt(&self.path, e.to_string())),
        };

        let baseline: Baseline = serde_json::from_str(&content)
            .map_err(|e| IntegrityError::corrupt(&self.path, e.to_string()))?;
        baseline
            .validate()
            .map_err(|reason| IntegrityError::corrupt(&self.path, reason))?;

        debug!(path = %self.path.display(), files = baseline.file_count(), "baseline loaded");
        Ok(baseline)
    }

    /// Persist `baseline`, replacing the previous record atomically
    ///
    /// The record is written to a temporary file next to the destination,
    /// synced, then renamed into place. An existing baseline's permissions
    /// carry over to the new file.
    pub fn save(&self, baseline: &Baseline) -> Result<()> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| IntegrityError::write(&self.path, e))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, baseline)
                .map_err(|e| IntegrityError::write(&self.path, e.into()))?;
            writer
                .write_all(b"\n")
                .and_then(|_| writer.flush())
                .map_err(|e| IntegrityError::write(&self.path, e))?;
        }
        if let Ok(existing) = fs::metadata(&self.path) {
            temp.as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| IntegrityError::write(&self.path, e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| IntegrityError::write(&self.path, e))?;
        temp.persist(&self.path)
            .map_err(|e| IntegrityError::write(&self.path, e.error))?;

        Ok(())
    }
}
