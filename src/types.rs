//! Shared types for SEEDBENCH.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that the bench, engine,
//! and strategy modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Hyperparameter variance
// ---------------------------------------------------------------------------

/// Whether a single hyperparameter is randomised, and within what bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterRange {
    pub vary: bool,
    pub min: f64,
    pub max: f64,
}

impl HyperparameterRange {
    /// A range that is drawn from uniformly.
    pub fn varied(min: f64, max: f64) -> Self {
        Self { vary: true, min, max }
    }

    /// A range that always resolves to the nominal value.
    pub fn fixed() -> Self {
        Self { vary: false, min: 0.0, max: 0.0 }
    }

    /// Midpoint of the bounds.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    fn validate(&self, name: &str) -> Result<(), BenchError> {
        if !self.vary {
            return Ok(());
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(BenchError::Config(format!(
                "{name}: variance bounds must be finite (min={}, max={})",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(BenchError::Config(format!(
                "{name}: variance min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if !(self.max - self.min).is_finite() {
            return Err(BenchError::Config(format!(
                "{name}: variance range is too wide (min={}, max={})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Which hyperparameters are randomised per simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarianceSpec {
    pub retail_mean_size: HyperparameterRange,
    pub retail_arrival_rate: HyperparameterRange,
    pub gbm_sigma: HyperparameterRange,
}

impl Default for VarianceSpec {
    fn default() -> Self {
        Self {
            retail_mean_size: HyperparameterRange::varied(19.0, 21.0),
            retail_arrival_rate: HyperparameterRange::varied(0.6, 1.0),
            gbm_sigma: HyperparameterRange::varied(0.000882, 0.001008),
        }
    }
}

impl VarianceSpec {
    /// No hyperparameter varies: every simulation uses the nominal values.
    pub fn fixed() -> Self {
        Self {
            retail_mean_size: HyperparameterRange::fixed(),
            retail_arrival_rate: HyperparameterRange::fixed(),
            gbm_sigma: HyperparameterRange::fixed(),
        }
    }

    /// Check every varied hyperparameter has finite bounds, `min <= max`
    /// and a width that fits in an `f64`.
    pub fn validate(&self) -> Result<(), BenchError> {
        self.retail_mean_size.validate("retail_mean_size")?;
        self.retail_arrival_rate.validate("retail_arrival_rate")?;
        self.gbm_sigma.validate("gbm_sigma")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Simulation parameters
// ---------------------------------------------------------------------------

/// Baseline simulation parameters, used as-is when a hyperparameter is not varied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NominalConfig {
    pub n_steps: u32,
    pub initial_price: f64,
    /// Initial X reserve of each pool.
    pub initial_x: f64,
    /// Initial Y (numeraire) reserve of each pool.
    pub initial_y: f64,
    pub gbm_mu: f64,
    pub gbm_sigma: f64,
    pub gbm_dt: f64,
    /// Expected retail orders per step.
    pub retail_arrival_rate: f64,
    /// Mean retail order size in Y units.
    pub retail_mean_size: f64,
    /// Log-normal dispersion of retail order sizes.
    pub retail_size_sigma: f64,
    pub retail_buy_prob: f64,
}

impl Default for NominalConfig {
    fn default() -> Self {
        let variance = VarianceSpec::default();
        Self {
            n_steps: 10_000,
            initial_price: 100.0,
            initial_x: 100.0,
            initial_y: 10_000.0,
            gbm_mu: 0.0,
            gbm_sigma: variance.gbm_sigma.midpoint(),
            gbm_dt: 1.0,
            retail_arrival_rate: variance.retail_arrival_rate.midpoint(),
            retail_mean_size: variance.retail_mean_size.midpoint(),
            retail_size_sigma: 1.2,
            retail_buy_prob: 0.5,
        }
    }
}

impl NominalConfig {
    /// Reject parameter sets the engine cannot simulate.
    pub fn validate(&self) -> Result<(), BenchError> {
        let positive = [
            ("initial_price", self.initial_price),
            ("initial_x", self.initial_x),
            ("initial_y", self.initial_y),
            ("gbm_dt", self.gbm_dt),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(BenchError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("gbm_sigma", self.gbm_sigma),
            ("retail_arrival_rate", self.retail_arrival_rate),
            ("retail_mean_size", self.retail_mean_size),
            ("retail_size_sigma", self.retail_size_sigma),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BenchError::Config(format!("{name} must be non-negative, got {value}")));
            }
        }

        if self.n_steps == 0 {
            return Err(BenchError::Config("n_steps must be at least 1".into()));
        }
        if !self.gbm_mu.is_finite() {
            return Err(BenchError::Config(format!("gbm_mu must be finite, got {}", self.gbm_mu)));
        }
        if !(0.0..=1.0).contains(&self.retail_buy_prob) {
            return Err(BenchError::Config(format!(
                "retail_buy_prob must be within [0, 1], got {}",
                self.retail_buy_prob
            )));
        }
        Ok(())
    }
}

/// The hyperparameter values drawn for one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHyperparameters {
    pub retail_mean_size: f64,
    pub retail_arrival_rate: f64,
    pub gbm_sigma: f64,
}

/// One fully-resolved parameter set for a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub n_steps: u32,
    pub initial_price: f64,
    pub initial_x: f64,
    pub initial_y: f64,
    pub gbm_mu: f64,
    pub gbm_sigma: f64,
    pub gbm_dt: f64,
    pub retail_arrival_rate: f64,
    pub retail_mean_size: f64,
    pub retail_size_sigma: f64,
    pub retail_buy_prob: f64,
    pub seed: u64,
}

impl SimulationConfig {
    /// Combine nominal fields, resolved hyperparameters and a seed.
    pub fn resolve(nominal: &NominalConfig, hyper: ResolvedHyperparameters, seed: u64) -> Self {
        Self {
            n_steps: nominal.n_steps,
            initial_price: nominal.initial_price,
            initial_x: nominal.initial_x,
            initial_y: nominal.initial_y,
            gbm_mu: nominal.gbm_mu,
            gbm_sigma: hyper.gbm_sigma,
            gbm_dt: nominal.gbm_dt,
            retail_arrival_rate: hyper.retail_arrival_rate,
            retail_mean_size: hyper.retail_mean_size,
            retail_size_sigma: nominal.retail_size_sigma,
            retail_buy_prob: nominal.retail_buy_prob,
            seed,
        }
    }
}

impl fmt::Display for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seed={} steps={} sigma={:.6} rate={:.3} size={:.2}",
            self.seed, self.n_steps, self.gbm_sigma, self.retail_arrival_rate, self.retail_mean_size,
        )
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one match between strategy A and strategy B.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Advantage of A over B summed across every simulation.
    pub total_edge_a: Decimal,
    /// Advantage of B over A (always `-total_edge_a`).
    pub total_edge_b: Decimal,
    pub wins_a: u32,
    pub wins_b: u32,
    pub draws: u32,
    pub simulations: u32,
}

impl MatchResult {
    /// Fold one simulation's edge of A over B into the totals.
    pub fn record(&mut self, edge_a: Decimal) {
        self.total_edge_a += edge_a;
        self.total_edge_b -= edge_a;
        self.simulations += 1;
        match edge_a.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => self.wins_a += 1,
            std::cmp::Ordering::Less => self.wins_b += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
        }
    }

    /// Combine partial results computed on different workers.
    pub fn merge(mut self, other: MatchResult) -> MatchResult {
        self.total_edge_a += other.total_edge_a;
        self.total_edge_b += other.total_edge_b;
        self.wins_a += other.wins_a;
        self.wins_b += other.wins_b;
        self.draws += other.draws;
        self.simulations += other.simulations;
        self
    }
}

/// Outcome of one seed-offset batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub seed_offset: u64,
    pub batch_size: usize,
    pub total_edge: Decimal,
    pub average_edge: Decimal,
    pub wins_a: u32,
    pub wins_b: u32,
    pub draws: u32,
}

impl BatchResult {
    /// Average a match result over the batch size.
    ///
    /// `batch_size` must be non-zero; the aggregator validates it before any batch runs.
    pub fn from_match(seed_offset: u64, batch_size: usize, result: &MatchResult) -> Self {
        let average_edge = result.total_edge_a / Decimal::from(batch_size as u64);
        Self {
            seed_offset,
            batch_size,
            total_edge: result.total_edge_a,
            average_edge,
            wins_a: result.wins_a,
            wins_b: result.wins_b,
            draws: result.draws,
        }
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed offset {:>6}: Edge = {}", self.seed_offset, two_places(self.average_edge))
    }
}

/// Round half-even to cents, then pad to exactly two decimals.
fn two_places(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Summary statistics across all batches of a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub run_id: String,
    pub strategy_a: String,
    pub strategy_b: String,
    pub batch_size: usize,
    /// Offsets whose batches completed, in run order.
    pub seed_offsets: Vec<u64>,
    /// Average edge per completed batch, aligned with `seed_offsets`.
    pub edges: Vec<Decimal>,
    pub mean: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    /// `max - min`.
    pub spread: Decimal,
    pub median: Decimal,
    /// Sample standard deviation of the per-batch edges (0 for a single batch).
    pub std_dev: f64,
    /// Offsets whose batches failed under the skip-and-continue policy.
    #[serde(default)]
    pub skipped_offsets: Vec<u64>,
    pub generated_at: DateTime<Utc>,
}

impl BenchmarkSummary {
    /// Number of batches that contributed to the statistics.
    pub fn batches(&self) -> usize {
        self.edges.len()
    }
}

impl fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let individual: Vec<String> = self.edges.iter().map(|e| two_places(*e)).collect();
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "  Individual: {}", individual.join(", "))?;
        writeln!(f, "  Mean edge:  {}", two_places(self.mean))?;
        writeln!(f, "  Min edge:   {}", two_places(self.min))?;
        writeln!(f, "  Max edge:   {}", two_places(self.max))?;
        writeln!(f, "  Spread:     {}", two_places(self.spread))?;
        if !self.skipped_offsets.is_empty() {
            writeln!(f, "  Skipped:    {:?}", self.skipped_offsets)?;
        }
        write!(f, "{rule}")
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SEEDBENCH.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BenchError {
    #[error("Compilation failed: {}", .0.join("; "))]
    Compilation(Vec<String>),

    #[error("Batch at seed offset {seed_offset} failed: {message}")]
    BatchExecution { seed_offset: u64, message: String },

    #[error("Strategy execution failed: {0}")]
    Strategy(String),

    #[error("Simulation with seed {seed} failed: {message}")]
    Simulation { seed: u64, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
