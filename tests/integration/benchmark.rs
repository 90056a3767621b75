//! End-to-end benchmark runs.
//!
//! Drives the CLI entry point and the aggregator against both the
//! scripted runner and the reference match engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use seedbench::bench::{Aggregator, BenchOptions, FailurePolicy, SeedOffsetBuilder};
use seedbench::cli::{execute, BenchArgs};
use seedbench::config::AppConfig;
use seedbench::engine::match_runner::MatchEngine;
use seedbench::strategy::baseline::load_vanilla_strategy;
use seedbench::strategy::compiler::StrategyCompiler;
use seedbench::strategy::program::CompiledStrategyFactory;
use seedbench::types::{NominalConfig, VarianceSpec};

use crate::mock_runner::ScriptedRunner;

const WIDENING: &str = r#"
name = "Widening"
base_fee_bps = 30
impact_bps = 8.0
decay = 0.8
max_fee_bps = 120
"#;

fn strategy_file(source: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("seedbench_it_strategy_{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, source).unwrap();
    path
}

fn args(strategy: PathBuf, sims: usize, seeds: usize, seed_spacing: u64) -> BenchArgs {
    BenchArgs {
        strategy,
        sims,
        seeds,
        seed_spacing,
        seed_start: 0,
    }
}

fn short_config(n_steps: u32) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.simulation = NominalConfig { n_steps, ..NominalConfig::default() };
    cfg
}

fn run_cli(args: &BenchArgs, cfg: &AppConfig, runner: Box<dyn seedbench::engine::BatchRunner>) -> (i32, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let code = execute(args, cfg, runner, buffer.clone()).unwrap();
    let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    (code, text)
}

fn compile(source: &str) -> CompiledStrategyFactory {
    CompiledStrategyFactory::new(StrategyCompiler::new().compile(source).unwrap())
}

// ---------------------------------------------------------------------------
// Scripted runner
// ---------------------------------------------------------------------------

#[test]
fn test_default_run_shape() {
    let path = strategy_file(WIDENING);
    let runner = ScriptedRunner::new(dec!(1.5));

    let (code, text) = run_cli(&args(path.clone(), 99, 5, 10_000), &AppConfig::default(), Box::new(runner.clone()));
    assert_eq!(code, 0);
    assert!(text.contains("Strategy: Widening\n"));
    assert!(text.contains("Running 5 batches x 99 sims (seed offsets: [0, 10000, 20000, 30000, 40000])..."));
    assert!(text.contains("  Seed offset  40000: Edge = 1.50\n"));
    assert!(text.contains("  Individual: 1.50, 1.50, 1.50, 1.50, 1.50\n"));
    assert!(text.contains("  Mean edge:  1.50\n"));
    assert!(text.contains("  Spread:     0.00\n"));

    let batches = runner.batches();
    assert_eq!(batches.len(), 5);
    let mut seen = HashSet::new();
    for (k, batch) in batches.iter().enumerate() {
        let offset = k as u64 * 10_000;
        assert_eq!(*batch, (offset..offset + 99).collect::<Vec<_>>());
        for seed in batch {
            assert!(seen.insert(*seed));
        }
    }

    for (a, b) in runner.contestants() {
        assert_eq!(a, "Widening");
        assert_eq!(b, "Vanilla_30bps");
    }

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_compilation_failure_runs_no_batches() {
    let path = strategy_file("name = \"Broken\"\nbase_fee_bps = ");
    let runner = ScriptedRunner::new(dec!(1));

    let (code, text) = run_cli(&args(path.clone(), 99, 5, 10_000), &AppConfig::default(), Box::new(runner.clone()));
    assert_eq!(code, 1);
    assert!(text.contains("Compilation failed:\n  - "));
    assert!(runner.batches().is_empty());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_skip_policy_reports_gap() {
    let path = strategy_file(WIDENING);
    let runner = ScriptedRunner::new(dec!(-2));
    runner.fail_at(10_000);

    let mut cfg = AppConfig::default();
    cfg.run.on_batch_failure = FailurePolicy::SkipAndContinue;

    let (code, text) = run_cli(&args(path.clone(), 10, 3, 10_000), &cfg, Box::new(runner.clone()));
    assert_eq!(code, 0);
    assert_eq!(runner.batches().len(), 3);
    assert!(!text.contains("Seed offset  10000"));
    assert!(text.contains("  Individual: -2.00, -2.00\n"));
    assert!(text.contains("  Skipped:    [10000]\n"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_fail_fast_stops_run() {
    let path = strategy_file(WIDENING);
    let runner = ScriptedRunner::new(dec!(1));
    runner.fail_at(10_000);

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let err = execute(
        &args(path.clone(), 10, 4, 10_000),
        &AppConfig::default(),
        Box::new(runner.clone()),
        buffer,
    )
    .unwrap_err();

    assert!(err.to_string().contains("seed offset 10000"));
    assert_eq!(runner.batches().len(), 2);

    std::fs::remove_file(&path).unwrap();
}

// ---------------------------------------------------------------------------
// Reference engine
// ---------------------------------------------------------------------------

#[test]
fn test_baseline_clone_ties_exactly() {
    let path = strategy_file("name = \"Clone30\"\nbase_fee_bps = 30\n");
    let engine = MatchEngine::new(2).unwrap();

    let (code, text) = run_cli(&args(path.clone(), 4, 3, 100), &short_config(300), Box::new(engine));
    assert_eq!(code, 0);
    assert!(text.contains("  Individual: 0.00, 0.00, 0.00\n"));
    assert!(text.contains("  Mean edge:  0.00\n"));
    assert!(text.contains("  Spread:     0.00\n"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_baseline_clone_summary_is_zero() {
    let clone = compile("name = \"Clone30\"\nbase_fee_bps = 30\n");
    let baseline = load_vanilla_strategy();
    let opts = BenchOptions { n_batches: 3, batch_size: 4, seed_spacing: 100, ..BenchOptions::default() };

    let aggregator = Aggregator::new(
        Box::new(MatchEngine::new(2).unwrap()),
        Box::new(SeedOffsetBuilder),
        NominalConfig { n_steps: 300, ..NominalConfig::default() },
        VarianceSpec::default(),
        opts,
    );
    let summary = aggregator.run(&clone, &baseline).unwrap();

    assert_eq!(summary.edges, vec![Decimal::ZERO; 3]);
    assert_eq!(summary.mean, Decimal::ZERO);
    assert_eq!(summary.spread, Decimal::ZERO);
    assert_eq!(summary.strategy_a, "Clone30");
}

#[test]
fn test_results_reproducible_across_worker_counts() {
    let strategy = compile(WIDENING);
    let baseline = load_vanilla_strategy();
    let opts = BenchOptions { n_batches: 2, batch_size: 3, seed_spacing: 1_000, ..BenchOptions::default() };

    let run = |workers: usize| {
        Aggregator::new(
            Box::new(MatchEngine::new(workers).unwrap()),
            Box::new(SeedOffsetBuilder),
            NominalConfig { n_steps: 300, ..NominalConfig::default() },
            VarianceSpec::default(),
            opts.clone(),
        )
        .run(&strategy, &baseline)
        .unwrap()
    };

    let first = run(1);
    let second = run(3);
    assert_eq!(first.edges, second.edges);
    assert_eq!(first.mean, second.mean);
    assert_eq!(first.seed_offsets, vec![0, 1_000]);
}
