//! SEEDBENCH: multi-seed strategy benchmark.
//!
//! Entry point. Parses arguments, loads configuration, initialises
//! structured logging, builds the match engine and runs the benchmark.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use seedbench::cli::{self, BenchArgs, Console};
use seedbench::config::{self, AppConfig};
use seedbench::engine::match_runner::MatchEngine;

fn main() -> ExitCode {
    let args = BenchArgs::parse();

    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!(error = %e, "Benchmark failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &BenchArgs) -> Result<i32> {
    let config_path = AppConfig::path_from_env();
    let cfg = AppConfig::load_or_default(&config_path)?;

    let workers = config::resolve_workers(&cfg.run)?;
    let engine = MatchEngine::new(workers)?;
    info!(
        strategy = %args.strategy.display(),
        sims = args.sims,
        seeds = args.seeds,
        workers = engine.workers(),
        config = %config_path,
        "SEEDBENCH starting up"
    );

    let console: Console = Arc::new(Mutex::new(std::io::stdout()));
    cli::execute(args, &cfg, Box::new(engine), console)
}

/// Initialise the tracing subscriber. Logs go to stderr so stdout carries
/// only the benchmark report.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("seedbench=info"));

    let json_logging = std::env::var("SEEDBENCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}
