//! ditop-report - summarize a recorded frame log as Markdown.

use std::path::PathBuf;

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use ditop::report::{render_markdown, summarize};

/// Frame log summary.
#[derive(Parser)]
#[command(name = "ditop-report", about = "Summarize a ditop frame log", version)]
struct Args {
    /// Frame log written by ditop --record or ditopd.
    #[arg(value_name = "FRAME_LOG")]
    path: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let mut filter = EnvFilter::from_default_env();
    for target in ["ditop_report", "ditop"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let stats = match summarize(&args.path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}: {}", args.path.display(), e);
            std::process::exit(1);
        }
    };
    info!(
        frames = stats.frames,
        skipped = stats.skipped_lines,
        "frame log summarized"
    );

    let report = render_markdown(&args.path.display().to_string(), &stats);
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, report) {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
        None => print!("{}", report),
    }
}
