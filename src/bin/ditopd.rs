//! ditopd - headless frame recorder.
//!
//! Runs the poll loop without a terminal, appends one frame per cycle to a
//! JSON-lines file and logs a one-line summary per cycle. Stops on Ctrl-C.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use ditop::config::{MonitorConfig, SourceSpec};
use ditop::provider::{LiveMonitor, Published};

/// Headless database health recorder.
#[derive(Parser)]
#[command(name = "ditopd", about = "Database health frame recorder", version)]
struct Args {
    /// Database vendor: postgres or mock.
    #[arg(long, default_value = "postgres")]
    vendor: String,

    /// PostgreSQL connection string. Defaults to the libpq environment variables.
    #[arg(long)]
    dsn: Option<String>,

    /// Record a synthetic demo workload instead of a database.
    #[arg(long, value_name = "FLAVOR", num_args = 0..=1, default_missing_value = "oracle")]
    demo: Option<String>,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Number of ranked wait events per frame (1-50).
    #[arg(long)]
    top_waits: Option<usize>,

    /// Frame log path.
    #[arg(short, long, default_value = "./data/frames.jsonl")]
    record: PathBuf,

    /// Instance name written to frames.
    #[arg(long)]
    instance: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
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
    for target in ["ditopd", "ditop"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// One-line cycle summary.
fn describe_cycle(p: &Published) -> String {
    let f = &p.frame;
    format!(
        "Frame #{} [{}]: aas={:.2} exec/s={:.0} waits={} sessions={} sql={} ({}ms)",
        p.cycle,
        f.collector_state.as_str(),
        f.metrics.active_sessions,
        f.metrics.sql_exec_per_sec,
        f.wait_events.len(),
        f.sessions.len(),
        f.sql_hotspots.len(),
        p.collect_ms
    )
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let spec = match SourceSpec::from_args(&args.vendor, args.dsn.clone(), args.demo.as_deref())
    {
        Ok(spec) => spec,
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    // History capacity is irrelevant without a renderer; keep the default.
    let top_waits = args
        .top_waits
        .unwrap_or_else(|| spec.vendor().default_top_waits());
    let config = match MonitorConfig::new(
        args.interval,
        MonitorConfig::default().history_capacity,
        top_waits,
    ) {
        Ok(c) => c
            .with_record(Some(args.record.clone()))
            .with_instance_name(args.instance.clone()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    info!("ditopd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: vendor={}, interval={}s, record={}",
        spec.vendor(),
        args.interval,
        args.record.display()
    );

    let source = match spec.open() {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    let mut monitor = match LiveMonitor::start(source, config) {
        Ok(m) => m,
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");
    monitor.run(&running, |p| {
        info!("{}", describe_cycle(p));
        if let Some(err) = &p.last_error {
            warn!("{}", err);
        }
    });

    let failures = monitor.frame_log_failures();
    if failures > 0 {
        warn!("{} frames could not be recorded", failures);
    }
    info!("Shutdown complete ({} cycles)", monitor.cycles());
}
