//! Recursive directory scanning into a path -> digest mapping

use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::digest::{hash_file, HashAlgorithm};
use crate::core::error::{IntegrityError, Result};

/// Relative path -> hex digest, produced fresh by every scan
pub type ScanResult = BTreeMap<String, String>;

/// An entry that could not be hashed or listed during a scan
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Output of one full traversal
#[derive(Debug, Clone, Default)]
pub struct TreeScan {
    pub files: ScanResult,
    pub skipped: Vec<SkippedEntry>,
}

/// Shared flag used to interrupt a running scan
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Walks a directory tree and hashes every regular file
///
/// Symlinks are never followed and never hashed.
#[derive(Clone)]
pub struct TreeScanner {
    algorithm: HashAlgorithm,
    cancel: CancelFlag,
    progress: ProgressBar,
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl TreeScanner {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            cancel: CancelFlag::new(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Scan `root` recursively
    ///
    /// Files that cannot be read are logged, recorded in `skipped` and left
    /// out of the mapping. Fails only if `root` is not a directory or the
    /// scan is cancelled.
    pub fn scan(&self, root: &Path) -> Result<TreeScan> {
        if !root.is_dir() {
            return Err(IntegrityError::InvalidDirectory {
                path: root.to_path_buf(),
            });
        }

        let (paths, mut skipped) = self.collect_files(root)?;
        debug!(root = %root.display(), files = paths.len(), "hashing files");

        let mut scan = self.hash_paths(root, paths)?;
        skipped.append(&mut scan.skipped);
        scan.skipped = skipped;
        Ok(scan)
    }

    /// Hash `paths` (all under `root`) into a scan result
    ///
    /// Unreadable files are skipped. Files whose keys coincide are all
    /// skipped, so no digest ever silently replaces another.
    pub(crate) fn hash_paths(&self, root: &Path, paths: Vec<PathBuf>) -> Result<TreeScan> {
        self.progress.set_length(paths.len() as u64);
        let algorithm = self.algorithm;
        let cancel = &self.cancel;

        let hashed: Vec<(PathBuf, Option<Result<String>>)> = paths
            .into_par_iter()
            .progress_with(self.progress.clone())
            .map(|path| {
                if cancel.is_cancelled() {
                    return (path, None);
                }
                let digest = hash_file(&path, algorithm);
                (path, Some(digest))
            })
            .collect();

        if self.cancel.is_cancelled() {
            self.progress.abandon();
            return Err(IntegrityError::Cancelled);
        }
        self.progress.finish_and_clear();

        let mut files = ScanResult::new();
        let mut origins: HashMap<String, PathBuf> = HashMap::new();
        let mut collided: HashSet<String> = HashSet::new();
        let mut skipped = Vec::new();

        for (path, digest) in hashed {
            let digest = match digest {
                Some(Ok(digest)) => digest,
                Some(Err(e)) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    skipped.push(SkippedEntry {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
                None => return Err(IntegrityError::Cancelled),
            };

            let key = relative_key(root, &path);
            if collided.contains(&key) {
                skipped.push(collision(path, &key));
                continue;
            }
            if let Some(first) = origins.remove(&key) {
                files.remove(&key);
                skipped.push(collision(first, &key));
                skipped.push(collision(path, &key));
                collided.insert(key);
                continue;
            }
            origins.insert(key.clone(), path);
            files.insert(key, digest);
        }

        Ok(TreeScan { files, skipped })
    }

    fn collect_files(&self, root: &Path) -> Result<(Vec<PathBuf>, Vec<SkippedEntry>)> {
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            if self.cancel.is_cancelled() {
                return Err(IntegrityError::Cancelled);
            }
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.push(entry.into_path());
                }
                Ok(entry) => {
                    if entry.path_is_symlink() {
                        debug!(path = %entry.path().display(), "not following symlink");
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    skipped.push(SkippedEntry {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok((files, skipped))
    }
}

fn collision(path: PathBuf, key: &str) -> SkippedEntry {
    warn!(path = %path.display(), key, "skipping file with ambiguous key");
    SkippedEntry {
        path,
        reason: format!("key '{}' is shared with another file", key),
    }
}

/// Key for `path` relative to `root`, `/`-separated on every platform
///
/// Names that are not valid UTF-8 are written with their raw bytes escaped
/// (`\xff`), so distinct names keep distinct keys.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(encode_component(part)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn encode_component(part: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;

    match part.to_str() {
        Some(name) => name.to_string(),
        None => part.as_bytes().escape_ascii().to_string(),
    }
}

#[cfg(not(unix))]
fn encode_component(part: &OsStr) -> String {
    part.to_string_lossy().into_owned()
}
