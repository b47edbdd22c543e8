//! Report writing functionality

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::core::monitor::Verification;

const SEPARATOR_WIDTH: usize = 40;

/// Write the drift sections of a verification
///
/// # Arguments
/// * `out` - Destination writer
/// * `verification` - Result of a verify or check run
pub fn write_drift_summary<W: Write>(out: &mut W, verification: &Verification) -> Result<()> {
    let report = &verification.report;

    write_section(out, "Added files", '+', &report.added)?;
    write_section(out, "Removed files", '-', &report.removed)?;
    write_section(out, "Modified files", '*', &report.modified)?;
    write_section(out, "Unreadable files", '?', &verification.unreadable)?;

    if verification.is_clean() {
        writeln!(out, "No changes detected. All files are intact.")?;
    }

    Ok(())
}

fn write_section<W: Write>(
    out: &mut W,
    title: &str,
    marker: char,
    paths: &BTreeSet<String>,
) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    writeln!(out, "{} ({}):", title, paths.len())?;
    for path in paths {
        writeln!(out, "  {} {}", marker, path)?;
    }
    Ok(())
}

/// Append one entry to the human-readable integrity log
///
/// The file is created if missing and never truncated.
///
/// # Arguments
/// * `log_path` - Path to the log file
/// * `verification` - Result to record
pub fn append_integrity_log(log_path: &Path, verification: &Verification) -> Result<()> {
    let mut entry = Vec::new();
    writeln!(
        entry,
        "Check Time: {}",
        verification.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(entry, "Directory: {}", verification.directory.display())?;
    write_drift_summary(&mut entry, verification)?;
    writeln!(entry, "{}", "-".repeat(SEPARATOR_WIDTH))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    file.write_all(&entry)?;

    Ok(())
}
