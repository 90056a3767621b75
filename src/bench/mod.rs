//! Seed-batch orchestration: sampling, batch building and aggregation.

pub mod aggregator;
pub mod builder;
pub mod sampler;

pub use aggregator::{seed_offsets, summarize, Aggregator, BenchOptions, EdgeStats, FailurePolicy};
pub use builder::{simulation_config, ConfigBatchBuilder, SeedOffsetBuilder};
