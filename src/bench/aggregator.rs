//! Multi-batch aggregator.
//!
//! Drives the batch runner across an arithmetic sequence of seed offsets,
//! one isolated match per offset, and reduces the per-batch average edges
//! to summary statistics.

use chrono::Utc;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bench::builder::ConfigBatchBuilder;
use crate::engine::BatchRunner;
use crate::strategy::StrategyFactory;
use crate::types::{BatchResult, BenchError, BenchmarkSummary, NominalConfig, VarianceSpec};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do when one batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run and return the batch error.
    #[default]
    FailFast,
    /// Log the failure, record the offset as skipped, and keep going.
    #[serde(alias = "skip")]
    SkipAndContinue,
}

/// Shape of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchOptions {
    pub n_batches: usize,
    pub batch_size: usize,
    pub seed_start: u64,
    pub seed_spacing: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            n_batches: 5,
            batch_size: 99,
            seed_start: 0,
            seed_spacing: 10_000,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl BenchOptions {
    /// Validate the run shape and return its seed offsets.
    ///
    /// Rejects empty runs, batches whose seed ranges would overlap, and
    /// seeds that do not fit in a `u64`.
    pub fn validate(&self) -> Result<Vec<u64>, BenchError> {
        if self.n_batches == 0 {
            return Err(BenchError::Config("number of batches must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(BenchError::Config("simulations per batch must be at least 1".into()));
        }
        if self.n_batches > 1 && self.seed_spacing < self.batch_size as u64 {
            return Err(BenchError::Config(format!(
                "seed spacing {} is smaller than the batch size {}: batches would share seeds",
                self.seed_spacing, self.batch_size
            )));
        }

        let offsets = seed_offsets(self.seed_start, self.seed_spacing, self.n_batches)?;
        let last_offset = offsets.last().copied().unwrap_or(self.seed_start);
        last_offset
            .checked_add(self.batch_size as u64 - 1)
            .ok_or_else(|| BenchError::Config("simulation seeds overflow u64".into()))?;
        Ok(offsets)
    }
}

/// `seed_start, seed_start + spacing, ...` for `n_batches` terms.
pub fn seed_offsets(seed_start: u64, seed_spacing: u64, n_batches: usize) -> Result<Vec<u64>, BenchError> {
    (0..n_batches as u64)
        .map(|k| {
            k.checked_mul(seed_spacing)
                .and_then(|delta| seed_start.checked_add(delta))
                .ok_or_else(|| BenchError::Config(format!("seed offset #{k} overflows u64")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Called with each batch result as soon as it is available.
pub type BatchObserver = Box<dyn Fn(&BatchResult) + Send + Sync>;

pub struct Aggregator {
    runner: Box<dyn BatchRunner>,
    builder: Box<dyn ConfigBatchBuilder>,
    nominal: NominalConfig,
    variance: VarianceSpec,
    options: BenchOptions,
    observer: Option<BatchObserver>,
}

impl Aggregator {
    pub fn new(
        runner: Box<dyn BatchRunner>,
        builder: Box<dyn ConfigBatchBuilder>,
        nominal: NominalConfig,
        variance: VarianceSpec,
        options: BenchOptions,
    ) -> Self {
        Self {
            runner,
            builder,
            nominal,
            variance,
            options,
            observer: None,
        }
    }

    /// Report every completed batch to `observer`.
    pub fn with_observer(mut self, observer: impl Fn(&BatchResult) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Validate everything a run depends on and return the seed offsets.
    pub fn plan(&self) -> Result<Vec<u64>, BenchError> {
        self.nominal.validate()?;
        self.variance.validate()?;
        self.options.validate()
    }

    /// Run one isolated batch at `seed_offset` with fresh strategy instances.
    pub fn run_batch(
        &self,
        seed_offset: u64,
        strategy_a: &dyn StrategyFactory,
        strategy_b: &dyn StrategyFactory,
    ) -> Result<BatchResult, BenchError> {
        let batch_size = self.options.batch_size;
        let configs = self.builder.build(seed_offset, batch_size, &self.nominal, &self.variance);
        if configs.len() != batch_size {
            return Err(BenchError::Config(format!(
                "config builder returned {} configs for a batch of {batch_size}",
                configs.len()
            )));
        }

        let instance_a = strategy_a.create();
        let instance_b = strategy_b.create();

        let result = self
            .runner
            .run_match(instance_a.as_ref(), instance_b.as_ref(), &configs)
            .map_err(|e| match e {
                BenchError::BatchExecution { .. } => e,
                other => BenchError::BatchExecution {
                    seed_offset,
                    message: other.to_string(),
                },
            })?;

        Ok(BatchResult::from_match(seed_offset, batch_size, &result))
    }

    /// Run every batch in order and summarise the per-batch average edges.
    pub fn run(
        &self,
        strategy_a: &dyn StrategyFactory,
        strategy_b: &dyn StrategyFactory,
    ) -> Result<BenchmarkSummary, BenchError> {
        let offsets = self.plan()?;
        info!(
            batches = offsets.len(),
            batch_size = self.options.batch_size,
            seed_start = self.options.seed_start,
            seed_spacing = self.options.seed_spacing,
            policy = ?self.options.failure_policy,
            "Starting benchmark"
        );

        let mut completed = Vec::with_capacity(offsets.len());
        let mut edges = Vec::with_capacity(offsets.len());
        let mut skipped = Vec::new();
        let mut last_error = None;

        for &offset in &offsets {
            match self.run_batch(offset, strategy_a, strategy_b) {
                Ok(batch) => {
                    info!(
                        seed_offset = offset,
                        average_edge = %batch.average_edge.round_dp(4),
                        wins_a = batch.wins_a,
                        wins_b = batch.wins_b,
                        draws = batch.draws,
                        "Batch complete"
                    );
                    if let Some(observer) = &self.observer {
                        observer(&batch);
                    }
                    completed.push(offset);
                    edges.push(batch.average_edge);
                }
                Err(e) => match self.options.failure_policy {
                    FailurePolicy::FailFast => {
                        error!(seed_offset = offset, error = %e, "Batch failed, aborting");
                        return Err(e);
                    }
                    FailurePolicy::SkipAndContinue => {
                        warn!(seed_offset = offset, error = %e, "Batch failed, skipping");
                        skipped.push(offset);
                        last_error = Some(e);
                    }
                },
            }
        }

        if edges.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| BenchError::Config("no batches were run".into())));
        }

        let stats = summarize(&edges)?;
        Ok(BenchmarkSummary {
            run_id: Uuid::new_v4().to_string(),
            strategy_a: strategy_a.name(),
            strategy_b: strategy_b.name(),
            batch_size: self.options.batch_size,
            seed_offsets: completed,
            edges,
            mean: stats.mean,
            min: stats.min,
            max: stats.max,
            spread: stats.spread,
            median: stats.median,
            std_dev: stats.std_dev,
            skipped_offsets: skipped,
            generated_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Descriptive statistics over per-batch edges.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStats {
    pub mean: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub spread: Decimal,
    pub median: Decimal,
    pub std_dev: f64,
}

/// Mean, min, max, spread, median and sample standard deviation.
pub fn summarize(edges: &[Decimal]) -> Result<EdgeStats, BenchError> {
    let (Some(&first), n) = (edges.first(), edges.len()) else {
        return Err(BenchError::Config("cannot summarise zero batches".into()));
    };

    let sum: Decimal = edges.iter().sum();
    let mean = sum / Decimal::from(n as u64);
    let min = edges.iter().copied().fold(first, Decimal::min);
    let max = edges.iter().copied().fold(first, Decimal::max);

    let mut sorted = edges.to_vec();
    sorted.sort();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / Decimal::TWO
    };

    Ok(EdgeStats {
        mean,
        min,
        max,
        spread: max - min,
        median,
        std_dev: sample_std_dev(edges),
    })
}

fn sample_std_dev(edges: &[Decimal]) -> f64 {
    if edges.len() < 2 {
        return 0.0;
    }
    let values: Vec<f64> = edges.iter().map(|e| e.to_f64().unwrap_or(0.0)).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
