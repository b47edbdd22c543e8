use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use file_integrity_rs::prelude::*;

/// Exit status when drift is found and `--fail-on-drift` is set
const DRIFT_EXIT_CODE: u8 = 2;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

#[derive(Parser)]
#[command(name = "file_integrity_rs")]
#[command(
    about = "File integrity monitor: baseline a directory tree and detect drift",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Baseline file location
    #[arg(
        short,
        long,
        global = true,
        env = "INTEGRITY_BASELINE",
        default_value = DEFAULT_BASELINE_FILE
    )]
    baseline: PathBuf,

    /// Append-only integrity log written by verify and check
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Digest algorithm (sha224, sha256, sha384, sha512)
    #[arg(short, long, global = true, default_value = "sha256")]
    algorithm: HashAlgorithm,

    /// Number of parallel worker threads (default: number of CPUs)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Run in batch mode (no progress bar)
    #[arg(long, global = true)]
    batch: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new baseline for a directory, replacing any existing one
    Create {
        /// Directory to baseline
        directory: PathBuf,
    },
    /// Verify the baseline's directory against the baseline
    Verify(ReportArgs),
    /// Compare any directory against the baseline without updating it
    Check {
        /// Directory to compare
        directory: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Do not append to the integrity log
    #[arg(long)]
    no_log: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when drift is detected
    #[arg(long)]
    fail_on_drift: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Set up graceful shutdown handler
    let cancel = CancelFlag::new();
    let cancel_handle = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n⚠️  Shutdown requested. Abandoning scan, nothing will be saved...");
        cancel_handle.cancel();
    })
    .context("Error setting Ctrl-C handler")?;

    // Set up rayon thread pool
    if let Some(workers) = cli.workers {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    let config = IntegrityConfig {
        baseline_path: cli.baseline,
        log_path: cli.log_file,
        algorithm: cli.algorithm,
    };
    let monitor = IntegrityMonitor::from_config(&config)
        .with_cancel_flag(cancel)
        .with_progress(progress_bar(cli.batch));

    match cli.command {
        Command::Create { directory } => run_create(&monitor, &directory),
        Command::Verify(report) => {
            let verification = monitor
                .verify(Utc::now())
                .context("Verification failed")?;
            finish_check(&verification, &report, &config.log_path)
        }
        Command::Check { directory, report } => {
            let verification = monitor
                .check(&directory, Utc::now())
                .with_context(|| format!("Check of {} failed", directory.display()))?;
            finish_check(&verification, &report, &config.log_path)
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "file_integrity_rs=debug"
    } else {
        "file_integrity_rs=info"
    };
    let filter =
        EnvFilter::try_from_env("INTEGRITY_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(batch: bool) -> ProgressBar {
    if batch {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn run_create(monitor: &IntegrityMonitor, directory: &Path) -> Result<ExitCode> {
    println!("🔍 Creating new baseline for directory: {}", directory.display());

    let created = monitor
        .create(directory, Utc::now())
        .context("Failed to create baseline")?;

    for entry in &created.skipped {
        eprintln!("⚠️  Skipped {}: {}", entry.path.display(), entry.reason);
    }
    println!("✅ Baseline saved to {}", monitor.store().path().display());
    println!("✅ Baseline created with {} files", created.file_count());

    Ok(ExitCode::SUCCESS)
}

fn finish_check(
    verification: &Verification,
    args: &ReportArgs,
    log_path: &Path,
) -> Result<ExitCode> {
    if args.json {
        let json = serde_json::to_string_pretty(verification)
            .context("Failed to serialize verification result")?;
        println!("{}", json);
    } else {
        println!(
            "🔎 Checked {} files in {}",
            verification.files_scanned,
            verification.directory.display()
        );
        println!();
        let stdout = io::stdout();
        write_drift_summary(&mut stdout.lock(), verification)?;
    }

    if !args.no_log {
        match append_integrity_log(log_path, verification) {
            Ok(()) => {
                if !args.json {
                    println!("\n📝 Changes logged to: {}", log_path.display());
                }
            }
            Err(e) => {
                eprintln!("⚠️  Warning: Failed to append to {}: {}", log_path.display(), e)
            }
        }
    }

    if args.fail_on_drift && !verification.is_clean() {
        return Ok(ExitCode::from(DRIFT_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}
