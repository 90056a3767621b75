//! Match execution: the batch runner contract and its reference engine.

pub mod amm;
pub mod market;
pub mod match_runner;

use crate::strategy::StrategyInstance;
use crate::types::{BenchError, MatchResult, SimulationConfig};

/// Runs one match between two strategies over a batch of simulations.
///
/// The instances handed in are fresh for this batch. Implementations must
/// not let state from one simulation leak into another.
#[cfg_attr(test, mockall::automock)]
pub trait BatchRunner: Send + Sync {
    /// Run every config and sum the edge of `strategy_a` over `strategy_b`.
    fn run_match(
        &self,
        strategy_a: &dyn StrategyInstance,
        strategy_b: &dyn StrategyInstance,
        configs: &[SimulationConfig],
    ) -> Result<MatchResult, BenchError>;
}
