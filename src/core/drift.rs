//! Drift detection between a baseline and a fresh scan

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::baseline::record::Baseline;
use crate::scanner::tree_scanner::ScanResult;

/// Three-way difference between a baseline and the current tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub modified: BTreeSet<String>,
}

impl DriftReport {
    /// True when nothing was added, removed or modified
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of drifted paths
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Compare a baseline against a fresh scan
///
/// Pure: neither input is modified. Unchanged files are left out of the report.
pub fn compare(baseline: &Baseline, current: &ScanResult) -> DriftReport {
    diff(
        baseline
            .files
            .iter()
            .map(|(path, record)| (path.as_str(), record.hash.as_str())),
        current,
    )
}

/// Compare two plain path -> digest mappings
pub fn compare_maps(expected: &BTreeMap<String, String>, current: &ScanResult) -> DriftReport {
    diff(
        expected.iter().map(|(path, hash)| (path.as_str(), hash.as_str())),
        current,
    )
}

fn diff<'a>(expected: impl Iterator<Item = (&'a str, &'a str)>, current: &ScanResult) -> DriftReport {
    let mut report = DriftReport::default();
    let mut seen = BTreeSet::new();

    for (path, hash) in expected {
        seen.insert(path);
        match current.get(path) {
            None => {
                report.removed.insert(path.to_string());
            }
            Some(current_hash) if current_hash != hash => {
                report.modified.insert(path.to_string());
            }
            Some(_) => {}
        }
    }

    report.added = current
        .keys()
        .filter(|path| !seen.contains(path.as_str()))
        .cloned()
        .collect();

    report
}
