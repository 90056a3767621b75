//! Command-line front end.
//!
//! Compiles the submitted strategy, runs it against the baseline across
//! several seed batches and prints progress plus a summary block.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::bench::{Aggregator, BenchOptions, SeedOffsetBuilder};
use crate::config::AppConfig;
use crate::engine::BatchRunner;
use crate::storage;
use crate::strategy::baseline::load_vanilla_strategy;
use crate::strategy::compiler::StrategyCompiler;
use crate::strategy::program::CompiledStrategyFactory;
use crate::strategy::StrategyFactory;
use crate::types::BenchError;

/// Where progress and summary lines are written.
pub type Console = Arc<Mutex<dyn Write + Send>>;

/// Benchmark a strategy against the 30 bps baseline over multiple seed batches.
#[derive(Debug, Clone, Parser)]
#[command(name = "seedbench", version, about)]
pub struct BenchArgs {
    /// Path to the strategy source file
    pub strategy: PathBuf,

    /// Simulations per batch
    #[arg(long, default_value_t = 99)]
    pub sims: usize,

    /// Number of seed batches
    #[arg(long, default_value_t = 5)]
    pub seeds: usize,

    /// Distance between consecutive seed offsets
    #[arg(long, default_value_t = 10_000)]
    pub seed_spacing: u64,

    /// First seed offset
    #[arg(long, default_value_t = 0)]
    pub seed_start: u64,
}

impl BenchArgs {
    /// Run shape for these arguments under the given config.
    pub fn options(&self, cfg: &AppConfig) -> BenchOptions {
        BenchOptions {
            n_batches: self.seeds,
            batch_size: self.sims,
            seed_start: self.seed_start,
            seed_spacing: self.seed_spacing,
            failure_policy: cfg.run.on_batch_failure,
        }
    }
}

fn say(console: &Console, line: &str) -> Result<()> {
    let mut out = console.lock().map_err(|_| anyhow!("console lock poisoned"))?;
    writeln!(out, "{line}")?;
    Ok(())
}

/// Run the benchmark and return the process exit code.
///
/// Compilation failures are reported on the console and yield `Ok(1)`.
/// Any other failure is returned as an error.
pub fn execute(
    args: &BenchArgs,
    cfg: &AppConfig,
    runner: Box<dyn BatchRunner>,
    console: Console,
) -> Result<i32> {
    say(&console, "Compiling strategy...")?;

    let path = args.strategy.display().to_string();
    let source = std::fs::read_to_string(&args.strategy)
        .with_context(|| format!("Failed to read strategy source: {path}"))?;

    let program = match StrategyCompiler::new().compile(&source) {
        Ok(program) => program,
        Err(BenchError::Compilation(errors)) => {
            warn!(path = %path, errors = errors.len(), "Strategy failed to compile");
            say(&console, "Compilation failed:")?;
            for error in &errors {
                say(&console, &format!("  - {error}"))?;
            }
            return Ok(1);
        }
        Err(other) => return Err(other.into()),
    };

    let strategy = CompiledStrategyFactory::new(program);
    let baseline = load_vanilla_strategy();
    let name = strategy.name();
    info!(path = %path, strategy = %name, "Strategy compiled");
    say(&console, &format!("Strategy: {name}"))?;

    let progress = Arc::clone(&console);
    let aggregator = Aggregator::new(
        runner,
        Box::new(SeedOffsetBuilder),
        cfg.simulation.clone(),
        cfg.variance.clone(),
        args.options(cfg),
    )
    .with_observer(move |batch| match progress.lock() {
        Ok(mut out) => {
            if let Err(e) = writeln!(out, "  {batch}") {
                warn!(error = %e, "Failed to write progress line");
            }
        }
        Err(_) => warn!(seed_offset = batch.seed_offset, "Console lock poisoned"),
    });

    let offsets = aggregator.plan()?;
    say(
        &console,
        &format!(
            "\nRunning {} batches x {} sims (seed offsets: {:?})...\n",
            args.seeds, args.sims, offsets
        ),
    )?;

    let summary = aggregator.run(&strategy, &baseline)?;
    say(&console, &format!("\n{summary}"))?;

    if let Some(report_path) = &cfg.run.report_path {
        storage::save_summary(&summary, report_path)?;
    }

    console
        .lock()
        .map_err(|_| anyhow!("console lock poisoned"))?
        .flush()?;
    Ok(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
