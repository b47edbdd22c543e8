//! Console and log output for verification results

pub mod report_writer;

pub use report_writer::{append_integrity_log, write_drift_summary};
