//! Config batch builder.
//!
//! Turns a seed offset into the ordered list of simulation configs for one
//! batch. Simulation `i` of a batch always runs with seed `seed_offset + i`.

use crate::bench::sampler;
use crate::types::{NominalConfig, SimulationConfig, VarianceSpec};

/// Produces the configs for one batch.
///
/// The aggregator takes one of these at construction, so alternative seed
/// schemes are swapped in at the call site.
pub trait ConfigBatchBuilder: Send + Sync {
    /// Build exactly `batch_size` configs for the batch at `seed_offset`.
    fn build(
        &self,
        seed_offset: u64,
        batch_size: usize,
        nominal: &NominalConfig,
        variance: &VarianceSpec,
    ) -> Vec<SimulationConfig>;
}

impl<F> ConfigBatchBuilder for F
where
    F: Fn(u64, usize, &NominalConfig, &VarianceSpec) -> Vec<SimulationConfig> + Send + Sync,
{
    fn build(
        &self,
        seed_offset: u64,
        batch_size: usize,
        nominal: &NominalConfig,
        variance: &VarianceSpec,
    ) -> Vec<SimulationConfig> {
        self(seed_offset, batch_size, nominal, variance)
    }
}

/// The default builder: seed `i + seed_offset` for index `i`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedOffsetBuilder;

impl ConfigBatchBuilder for SeedOffsetBuilder {
    fn build(
        &self,
        seed_offset: u64,
        batch_size: usize,
        nominal: &NominalConfig,
        variance: &VarianceSpec,
    ) -> Vec<SimulationConfig> {
        (0..batch_size as u64)
            .map(|i| simulation_config(i + seed_offset, nominal, variance))
            .collect()
    }
}

/// Resolve the config of the single simulation that runs with `seed`.
pub fn simulation_config(seed: u64, nominal: &NominalConfig, variance: &VarianceSpec) -> SimulationConfig {
    let hyper = sampler::sample(seed, nominal, variance);
    SimulationConfig::resolve(nominal, hyper, seed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
