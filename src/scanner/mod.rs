//! Directory traversal and hashing

pub mod tree_scanner;

pub use tree_scanner::{relative_key, CancelFlag, ScanResult, SkippedEntry, TreeScan, TreeScanner};
