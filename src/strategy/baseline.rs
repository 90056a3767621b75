//! The baseline ("vanilla") strategy every submission is measured against.

use crate::strategy::compiler::CompiledStrategy;
use crate::strategy::program::CompiledStrategyFactory;

/// Name reported for the baseline.
pub const VANILLA_NAME: &str = "Vanilla_30bps";

/// Fixed fee of the baseline on both sides.
pub const VANILLA_FEE_BPS: f64 = 30.0;

/// Load the baseline strategy: a constant 30 bps pool.
pub fn load_vanilla_strategy() -> CompiledStrategyFactory {
    CompiledStrategyFactory::new(CompiledStrategy::flat(VANILLA_NAME, VANILLA_FEE_BPS))
}
