//! ditop - interactive database health dashboard.
//!
//! Usage:
//!   ditop                         # PostgreSQL via PGHOST/PGUSER/... every 6s
//!   ditop --dsn "host=db user=x"  # explicit connection string
//!   ditop -i 2 --record f.jsonl   # faster cadence, record frames
//!   ditop --demo tibero           # synthetic workload, no database needed

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use ditop::config::{MonitorConfig, SourceSpec};
use ditop::provider::LiveMonitor;
use ditop::tui::App;

/// Interactive database health dashboard.
#[derive(Parser)]
#[command(name = "ditop", about = "Live database health dashboard", version)]
struct Args {
    /// Database vendor: postgres or mock.
    /// oracle and tibero are recognised but have no live adapter.
    #[arg(long, default_value = "postgres")]
    vendor: String,

    /// PostgreSQL connection string. Defaults to the libpq environment variables.
    #[arg(long)]
    dsn: Option<String>,

    /// Run a synthetic demo workload (oracle, tibero or postgres vocabulary).
    #[arg(long, value_name = "FLAVOR", num_args = 0..=1, default_missing_value = "oracle")]
    demo: Option<String>,

    /// Refresh interval in seconds.
    #[arg(short, long, default_value = "6")]
    interval: u64,

    /// Samples kept per metric for sparklines.
    #[arg(long, default_value = "60")]
    history: usize,

    /// Number of ranked wait events (1-50). Defaults to the vendor's usual cap.
    #[arg(long)]
    top_waits: Option<usize>,

    /// Append every frame to this JSON-lines file.
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Instance name shown in the title and written to frames.
    #[arg(long)]
    instance: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Write logs to this file. Without it nothing is logged, since the
    /// dashboard owns the terminal.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Initializes file logging. Returns an error when the file cannot be opened.
fn init_logging(verbose: u8, quiet: bool, path: &Path) -> std::io::Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("ditop={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Some(path) = &args.log_file
        && let Err(e) = init_logging(args.verbose, args.quiet, path)
    {
        eprintln!("Error: cannot open log file '{}': {}", path.display(), e);
        std::process::exit(1);
    }

    let spec = match SourceSpec::from_args(&args.vendor, args.dsn.clone(), args.demo.as_deref())
    {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let top_waits = args
        .top_waits
        .unwrap_or_else(|| spec.vendor().default_top_waits());
    let config = match MonitorConfig::new(args.interval, args.history, top_waits) {
        Ok(c) => c
            .with_record(args.record.clone())
            .with_instance_name(args.instance.clone()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let source = match spec.open() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Set PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE or pass --dsn.");
            std::process::exit(e.exit_code());
        }
    };

    info!("ditop {} starting", env!("CARGO_PKG_VERSION"));
    let monitor = match LiveMonitor::start(source, config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    if let Err(e) = App::new(monitor, running).run() {
        eprintln!("Error: terminal failure: {}", e);
        std::process::exit(1);
    }
    info!("ditop stopped");
}
