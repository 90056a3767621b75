//! Persistence layer.
//!
//! Saves and loads benchmark summaries to/from JSON files so runs can be
//! compared after the fact.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::BenchmarkSummary;

/// Save a benchmark summary as pretty JSON.
pub fn save_summary(summary: &BenchmarkSummary, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create report directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(summary)
        .context("Failed to serialise benchmark summary")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write report to {path}"))?;

    info!(path, run_id = %summary.run_id, batches = summary.batches(), "Report saved");
    Ok(())
}

/// Load a benchmark summary from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_summary(path: &str) -> Result<Option<BenchmarkSummary>> {
    if !Path::new(path).exists() {
        debug!(path, "No report found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read report from {path}"))?;

    let summary: BenchmarkSummary = serde_json::from_str(&json)
        .context(format!("Failed to parse report from {path}"))?;

    Ok(Some(summary))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
