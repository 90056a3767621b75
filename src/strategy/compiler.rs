//! Strategy compiler.
//!
//! Strategy sources are small TOML documents describing a fee schedule:
//!
//! ```toml
//! name = "Widening30"
//! base_fee_bps = 30
//! impact_bps = 5.0
//! decay = 0.9
//! max_fee_bps = 100
//! ```
//!
//! Compilation collects every diagnostic instead of stopping at the first,
//! so a single run reports all problems in the source.

use serde::Deserialize;
use tracing::debug;

use crate::types::BenchError;

/// Largest fee a source may declare, in basis points.
pub const MAX_FEE_BPS: f64 = 1_000.0;

/// Raw, unvalidated source fields.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrategySource {
    name: Option<String>,
    base_fee_bps: Option<f64>,
    bid_fee_bps: Option<f64>,
    ask_fee_bps: Option<f64>,
    #[serde(default)]
    impact_bps: f64,
    #[serde(default)]
    decay: f64,
    max_fee_bps: Option<f64>,
}

/// A validated, immutable strategy program.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStrategy {
    pub name: String,
    pub bid_fee_bps: f64,
    pub ask_fee_bps: f64,
    /// Extra bps on the hit side per 1% of the Y reserve traded.
    pub impact_bps: f64,
    /// Fraction of the accumulated widening kept after each trade.
    pub decay: f64,
    pub max_fee_bps: f64,
}

impl CompiledStrategy {
    /// A constant-fee program.
    pub fn flat(name: &str, fee_bps: f64) -> Self {
        Self {
            name: name.to_string(),
            bid_fee_bps: fee_bps,
            ask_fee_bps: fee_bps,
            impact_bps: 0.0,
            decay: 0.0,
            max_fee_bps: fee_bps,
        }
    }
}

/// Compiles strategy sources into [`CompiledStrategy`] programs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrategyCompiler;

impl StrategyCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate a strategy source.
    ///
    /// Returns [`BenchError::Compilation`] with one message per problem.
    pub fn compile(&self, source: &str) -> Result<CompiledStrategy, BenchError> {
        let raw: StrategySource = toml::from_str(source)
            .map_err(|e| BenchError::Compilation(vec![format!("syntax error: {}", e.message())]))?;

        let mut errors = Vec::new();

        let name = match raw.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                errors.push("missing strategy name".to_string());
                String::new()
            }
        };

        let base = raw.base_fee_bps;
        let bid = raw.bid_fee_bps.or(base);
        let ask = raw.ask_fee_bps.or(base);
        if bid.is_none() || ask.is_none() {
            errors.push("base_fee_bps is required unless both bid_fee_bps and ask_fee_bps are set".to_string());
        }
        let bid = bid.unwrap_or(0.0);
        let ask = ask.unwrap_or(0.0);

        check_fee(&mut errors, "base_fee_bps", base);
        check_fee(&mut errors, "bid_fee_bps", raw.bid_fee_bps);
        check_fee(&mut errors, "ask_fee_bps", raw.ask_fee_bps);
        check_fee(&mut errors, "max_fee_bps", raw.max_fee_bps);

        let max_fee_bps = raw.max_fee_bps.unwrap_or(MAX_FEE_BPS);
        if max_fee_bps < bid.max(ask) {
            errors.push(format!(
                "max_fee_bps ({max_fee_bps}) is below the quoted fees (bid {bid}, ask {ask})"
            ));
        }

        if !raw.impact_bps.is_finite() || raw.impact_bps < 0.0 {
            errors.push(format!("impact_bps must be non-negative, got {}", raw.impact_bps));
        }
        if !(0.0..=1.0).contains(&raw.decay) {
            errors.push(format!("decay must be within [0, 1], got {}", raw.decay));
        }

        if !errors.is_empty() {
            debug!(count = errors.len(), "Strategy compilation failed");
            return Err(BenchError::Compilation(errors));
        }

        Ok(CompiledStrategy {
            name,
            bid_fee_bps: bid,
            ask_fee_bps: ask,
            impact_bps: raw.impact_bps,
            decay: raw.decay,
            max_fee_bps,
        })
    }
}

fn check_fee(errors: &mut Vec<String>, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if !v.is_finite() || !(0.0..=MAX_FEE_BPS).contains(&v) {
            errors.push(format!("{field} must be within [0, {MAX_FEE_BPS}], got {v}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
