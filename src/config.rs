//! Configuration loading from TOML with environment variable overrides.
//!
//! Reads `seedbench.toml` (or the file named by `SEEDBENCH_CONFIG`) and
//! deserializes into strongly-typed structs. Every section is optional and
//! falls back to the baseline benchmark settings.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::bench::FailurePolicy;
use crate::types::{NominalConfig, VarianceSpec};

/// Config file read when `SEEDBENCH_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "seedbench.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SEEDBENCH_CONFIG";

/// Environment variable overriding the worker count.
pub const WORKERS_ENV: &str = "SEEDBENCH_WORKERS";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: NominalConfig,
    pub variance: VarianceSpec,
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Simulation worker threads. Unset means one per available core.
    pub workers: Option<usize>,
    /// Write the summary as JSON here after a successful run.
    pub report_path: Option<String>,
    pub on_batch_failure: FailurePolicy,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise use the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            let cfg = Self::load(path)?;
            info!(path, "Loaded config");
            Ok(cfg)
        } else {
            debug!(path, "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document.
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.simulation.validate()?;
        cfg.variance.validate()?;
        Ok(cfg)
    }

    /// Config file path: `SEEDBENCH_CONFIG` or the default.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
    }
}

/// Worker count: `SEEDBENCH_WORKERS`, then `run.workers`, then available parallelism.
pub fn resolve_workers(run: &RunConfig) -> Result<usize> {
    let from_env = std::env::var(WORKERS_ENV).ok();
    let workers = workers_from(from_env.as_deref(), run.workers)?;
    debug!(workers, "Resolved worker count");
    Ok(workers)
}

fn workers_from(env_value: Option<&str>, configured: Option<usize>) -> Result<usize> {
    let workers = match (env_value, configured) {
        (Some(raw), _) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{WORKERS_ENV} is not a valid count: {raw:?}"))?,
        (None, Some(n)) => n,
        (None, None) => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    };
    if workers == 0 {
        bail!("worker count must be at least 1");
    }
    Ok(workers)
}
