//! Integration tests for the create / verify / check pipelines
//!
//! Each test baselines a throwaway directory tree, mutates it and checks the
//! reported drift.

use chrono::{Duration, Utc};
use file_integrity_rs::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Workspace holding the baseline file, separate from the monitored tree
fn monitor_in(workspace: &TempDir) -> IntegrityMonitor {
    IntegrityMonitor::new(
        BaselineStore::new(workspace.path().join("file_baseline.json")),
        TreeScanner::new(HashAlgorithm::Sha256),
    )
}

fn populated_tree() -> TempDir {
    let tree = TempDir::new().unwrap();
    write(tree.path(), "a.txt", "hello");
    write(tree.path(), "c.txt", "to be deleted");
    write(tree.path(), "etc/app.conf", "port = 8080");
    write(tree.path(), "etc/nested/deep.bin", "\u{0}\u{1}\u{2}");
    tree
}

#[test]
fn test_create_reports_file_count() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();

    let created = monitor_in(&workspace).create(tree.path(), Utc::now()).unwrap();
    assert_eq!(created.file_count(), 4);
    assert!(created.skipped.is_empty());

    let baseline = created.baseline;
    assert!(baseline.directory.is_absolute());
    assert!(baseline.files.contains_key("etc/nested/deep.bin"));
}

#[test]
fn test_create_then_verify_is_clean() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);

    monitor.create(tree.path(), Utc::now()).unwrap();
    let verification = monitor.verify(Utc::now()).unwrap();

    assert!(verification.is_clean());
    assert!(verification.report.is_clean());
    assert_eq!(verification.files_scanned, 4);
}

#[test]
fn test_verify_twice_only_advances_timestamps() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);

    let created_at = Utc::now() - Duration::hours(2);
    let first_check = created_at + Duration::hours(1);
    let second_check = created_at + Duration::hours(2);

    let original = monitor.create(tree.path(), created_at).unwrap().baseline;

    assert!(monitor.verify(first_check).unwrap().is_clean());
    assert!(monitor.verify(second_check).unwrap().is_clean());

    let stored = monitor.store().load().unwrap();
    assert_eq!(stored.directory, original.directory);
    assert_eq!(stored.timestamp, created_at);
    assert_eq!(stored.files.len(), original.files.len());
    for (path, record) in &stored.files {
        assert_eq!(record.hash, original.files[path].hash);
        assert_eq!(record.last_checked, second_check);
    }
}

#[test]
fn test_detects_modification() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    write(tree.path(), "a.txt", "world");
    let verification = monitor.verify(Utc::now()).unwrap();

    assert_eq!(verification.report.modified, set(&["a.txt"]));
    assert!(verification.report.added.is_empty());
    assert!(verification.report.removed.is_empty());
}

#[test]
fn test_detects_addition() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    write(tree.path(), "b.txt", "new");
    write(tree.path(), "etc/extra.conf", "x");
    let verification = monitor.verify(Utc::now()).unwrap();

    assert_eq!(verification.report.added, set(&["b.txt", "etc/extra.conf"]));
    assert!(verification.report.removed.is_empty());
    assert!(verification.report.modified.is_empty());
}

#[test]
fn test_detects_deletion() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    fs::remove_file(tree.path().join("c.txt")).unwrap();
    let verification = monitor.verify(Utc::now()).unwrap();

    assert_eq!(verification.report.removed, set(&["c.txt"]));
    assert!(verification.report.added.is_empty());
    assert!(verification.unreadable.is_empty());
}

#[test]
fn test_modification_keeps_being_reported() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    write(tree.path(), "etc/app.conf", "port = 9090");
    assert_eq!(monitor.verify(Utc::now()).unwrap().report.modified, set(&["etc/app.conf"]));
    assert_eq!(monitor.verify(Utc::now()).unwrap().report.modified, set(&["etc/app.conf"]));
}

#[test]
fn test_verify_without_baseline_is_not_found() {
    let workspace = TempDir::new().unwrap();
    let monitor = monitor_in(&workspace);

    let err = monitor.verify(Utc::now()).unwrap_err();
    assert!(matches!(err, IntegrityError::NotFound { .. }));
    assert!(!workspace.path().join("file_baseline.json").exists());
}

#[test]
fn test_create_rejects_invalid_directory() {
    let workspace = TempDir::new().unwrap();
    let monitor = monitor_in(&workspace);

    let err = monitor
        .create(&workspace.path().join("does-not-exist"), Utc::now())
        .unwrap_err();
    assert!(matches!(err, IntegrityError::InvalidDirectory { .. }));
    assert!(!monitor.store().exists());
}

#[test]
fn test_check_is_read_only() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();
    let before = fs::read(monitor.store().path()).unwrap();

    let copy = TempDir::new().unwrap();
    write(copy.path(), "a.txt", "hello");
    write(copy.path(), "etc/app.conf", "port = 8080");
    write(copy.path(), "etc/nested/deep.bin", "changed");
    write(copy.path(), "extra.txt", "extra");

    let verification = monitor.check(copy.path(), Utc::now()).unwrap();
    assert_eq!(verification.report.added, set(&["extra.txt"]));
    assert_eq!(verification.report.removed, set(&["c.txt"]));
    assert_eq!(verification.report.modified, set(&["etc/nested/deep.bin"]));

    let after = fs::read(monitor.store().path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_check_relocated_tree_is_clean() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    let relocated = TempDir::new().unwrap();
    let target = relocated.path().join("moved");
    fs::rename(tree.path(), &target).unwrap();

    let verification = monitor.check(&target, Utc::now()).unwrap();
    assert!(verification.is_clean());

    // put it back so TempDir cleanup succeeds
    fs::rename(&target, tree.path()).unwrap();
}

#[test]
fn test_recreate_replaces_baseline() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    write(tree.path(), "b.txt", "new");
    assert_eq!(monitor.create(tree.path(), Utc::now()).unwrap().file_count(), 5);
    assert!(monitor.verify(Utc::now()).unwrap().is_clean());
}

#[test]
fn test_baseline_file_schema() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    let raw = fs::read_to_string(monitor.store().path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let object = json.as_object().unwrap();
    let mut keys: Vec<_> = object.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["directory", "files", "timestamp"]);

    let record = &json["files"]["a.txt"];
    // SHA-256 of "hello"
    assert_eq!(
        record["hash"],
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert!(record["last_checked"].is_string());
}

#[test]
fn test_verification_log_entry() {
    let workspace = TempDir::new().unwrap();
    let tree = populated_tree();
    let monitor = monitor_in(&workspace);
    monitor.create(tree.path(), Utc::now()).unwrap();

    write(tree.path(), "a.txt", "world");
    let verification = monitor.verify(Utc::now()).unwrap();

    let log_path = workspace.path().join("integrity_log.txt");
    append_integrity_log(&log_path, &verification).unwrap();
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.starts_with("Check Time: "));
    assert!(log.contains("Modified files (1):\n  * a.txt"));
}

#[cfg(unix)]
#[test]
fn test_detects_modification_of_non_utf8_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let workspace = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let first = tree.path().join(OsStr::from_bytes(b"a\xff"));
    let second = tree.path().join(OsStr::from_bytes(b"a\xfe"));
    if fs::write(&first, "one").is_err() {
        return;
    }
    fs::write(&second, "two").unwrap();

    let monitor = monitor_in(&workspace);
    assert_eq!(monitor.create(tree.path(), Utc::now()).unwrap().file_count(), 2);

    fs::write(&first, "tampered").unwrap();
    let verification = monitor.verify(Utc::now()).unwrap();
    assert_eq!(verification.report.modified, set(&["a\\xff"]));
    assert!(!verification.is_clean());
}
