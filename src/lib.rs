//! File Integrity Library
//!
//! Records cryptographic digests of every file under a directory tree and
//! reports which files were added, removed or modified since.

pub mod baseline;
pub mod core;
pub mod reporting;
pub mod scanner;

pub use crate::baseline::store;
pub use crate::core::{digest, drift, monitor};
pub use crate::scanner::tree_scanner;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::baseline::{Baseline, BaselineStore, CreatedBaseline, FileRecord, DEFAULT_BASELINE_FILE};
    pub use crate::core::config::{IntegrityConfig, DEFAULT_LOG_FILE};
    pub use crate::core::digest::{hash_file, HashAlgorithm};
    pub use crate::core::drift::{compare, compare_maps, DriftReport};
    pub use crate::core::error::{IntegrityError, Result};
    pub use crate::core::monitor::{IntegrityMonitor, Verification};
    pub use crate::reporting::report_writer::{append_integrity_log, write_drift_summary};
    pub use crate::scanner::tree_scanner::{CancelFlag, ScanResult, SkippedEntry, TreeScan, TreeScanner};
}
