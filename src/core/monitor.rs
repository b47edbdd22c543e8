//! Create, verify and check pipelines

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::config::IntegrityConfig;
use super::drift::{compare, DriftReport};
use super::error::{IntegrityError, Result};
use crate::baseline::record::Baseline;
use crate::baseline::store::{BaselineStore, CreatedBaseline};
use crate::scanner::tree_scanner::{
    relative_key, CancelFlag, SkippedEntry, TreeScan, TreeScanner,
};

/// Structured result of one integrity check
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub directory: PathBuf,
    pub checked_at: DateTime<Utc>,
    pub files_scanned: usize,
    #[serde(flatten)]
    pub report: DriftReport,
    /// Baseline files still present on disk that could not be hashed
    ///
    /// Kept out of `report.removed`, so `report` together with this set and
    /// the unchanged files covers every baseline and current path.
    pub unreadable: BTreeSet<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.report.is_clean() && self.unreadable.is_empty()
    }
}

/// Ties a baseline store to a scanner
pub struct IntegrityMonitor {
    store: BaselineStore,
    scanner: TreeScanner,
}

impl IntegrityMonitor {
    pub fn new(store: BaselineStore, scanner: TreeScanner) -> Self {
        Self { store, scanner }
    }

    pub fn from_config(config: &IntegrityConfig) -> Self {
        Self::new(
            BaselineStore::new(&config.baseline_path),
            TreeScanner::new(config.algorithm),
        )
    }

    /// Interrupt scans when `cancel` is set
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.scanner = self.scanner.with_cancel_flag(cancel);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.scanner = self.scanner.with_progress(progress);
        self
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    pub fn scanner(&self) -> &TreeScanner {
        &self.scanner
    }

    /// Baseline `root`, replacing any existing baseline
    pub fn create(&self, root: &Path, now: DateTime<Utc>) -> Result<CreatedBaseline> {
        self.store.create(root, &self.scanner, now)
    }

    /// Rescan the baseline's own directory and report drift
    ///
    /// Every record's `last_checked` is advanced to `now` and the baseline is
    /// saved, whether or not drift was found.
    pub fn verify(&self, now: DateTime<Utc>) -> Result<Verification> {
        let mut baseline = self.store.load()?;
        if !baseline.directory.is_dir() {
            return Err(IntegrityError::InvalidDirectory {
                path: baseline.directory.clone(),
            });
        }
        self.ensure_algorithm(&baseline)?;

        info!(directory = %baseline.directory.display(), "verifying against baseline");
        let scan = self.scanner.scan(&baseline.directory)?;
        let verification = build_verification(&baseline, baseline.directory.clone(), scan, now);

        baseline.touch_all(now);
        self.store.save(&baseline)?;

        log_outcome(&verification);
        Ok(verification)
    }

    /// Compare an arbitrary directory against the baseline without modifying it
    pub fn check(&self, directory: &Path, now: DateTime<Utc>) -> Result<Verification> {
        let baseline = self.store.load()?;
        self.ensure_algorithm(&baseline)?;

        info!(directory = %directory.display(), "checking directory against baseline");
        let scan = self.scanner.scan(directory)?;
        let verification = build_verification(&baseline, directory.to_path_buf(), scan, now);

        log_outcome(&verification);
        Ok(verification)
    }

    fn ensure_algorithm(&self, baseline: &Baseline) -> Result<()> {
        let algorithm = self.scanner.algorithm();
        match baseline
            .files
            .iter()
            .find(|(_, record)| record.hash.len() != algorithm.hex_len())
        {
            Some((path, record)) => Err(IntegrityError::AlgorithmMismatch {
                expected: algorithm.to_string(),
                path: path.clone(),
                found: record.hash.len(),
            }),
            None => Ok(()),
        }
    }
}

fn build_verification(
    baseline: &Baseline,
    directory: PathBuf,
    scan: TreeScan,
    now: DateTime<Utc>,
) -> Verification {
    let mut report = compare(baseline, &scan.files);

    // Skipped entries were seen on disk; they are unreadable, not removed.
    let skipped_keys: Vec<String> = scan
        .skipped
        .iter()
        .map(|entry| relative_key(&directory, &entry.path))
        .collect();
    let unreadable: BTreeSet<String> = report
        .removed
        .iter()
        .filter(|path| {
            skipped_keys.iter().any(|key| {
                key.is_empty() || *path == key || path.starts_with(&format!("{}/", key))
            })
        })
        .cloned()
        .collect();
    report.removed.retain(|path| !unreadable.contains(path));

    Verification {
        directory,
        checked_at: now,
        files_scanned: scan.files.len(),
        report,
        unreadable,
        skipped: scan.skipped,
    }
}

fn log_outcome(verification: &Verification) {
    if verification.is_clean() {
        info!(files = verification.files_scanned, "no changes detected");
    } else {
        warn!(
            added = verification.report.added.len(),
            removed = verification.report.removed.len(),
            modified = verification.report.modified.len(),
            unreadable = verification.unreadable.len(),
            "drift detected"
        );
    }
}
