//! Strategy layer: the opaque fee-setting participants of a match.
//!
//! The harness never looks inside a strategy. It only needs fresh,
//! resettable instances that react to each trade on their pool with the
//! fees for the next one.

pub mod baseline;
pub mod compiler;
pub mod program;

use serde::{Deserialize, Serialize};

use crate::types::BenchError;

/// Hard ceiling on any fee a strategy may quote (100%).
pub const MAX_FEE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Fees and trade observations
// ---------------------------------------------------------------------------

/// Fees quoted by a pool, as fractions of the input amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    /// Charged when a trader sells X into the pool.
    pub bid: f64,
    /// Charged when a trader buys X from the pool.
    pub ask: f64,
}

impl Fees {
    pub fn from_bps(bid_bps: f64, ask_bps: f64) -> Self {
        Self {
            bid: bid_bps / 10_000.0,
            ask: ask_bps / 10_000.0,
        }
    }

    /// Fees must be finite and within `[0, 1)`.
    pub fn validate(&self) -> Result<(), String> {
        for (side, fee) in [("bid", self.bid), ("ask", self.ask)] {
            if !fee.is_finite() || fee < 0.0 || fee >= MAX_FEE {
                return Err(format!("{side} fee out of range: {fee}"));
            }
        }
        Ok(())
    }
}

/// Direction of a fill, from the trader's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    /// Trader pays Y and receives X.
    Buy,
    /// Trader pays X and receives Y.
    Sell,
}

/// What a strategy sees after a fill on its own pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeObservation {
    pub step: u32,
    pub side: TradeSide,
    pub amount_x: f64,
    pub amount_y: f64,
    /// Reserves after the fill.
    pub reserve_x: f64,
    pub reserve_y: f64,
}

// ---------------------------------------------------------------------------
// Instances and factories
// ---------------------------------------------------------------------------

/// One stateful strategy participant.
///
/// Instances may carry state across trades, so the harness builds a fresh
/// pair per batch and each simulation works on its own `box_clone`.
pub trait StrategyInstance: Send + Sync {
    /// Human-readable strategy name.
    fn name(&self) -> &str;

    /// Drop all per-simulation state.
    fn reset(&mut self);

    /// Fees to quote before the first trade.
    fn initial_fees(&mut self, reserve_x: f64, reserve_y: f64) -> Result<Fees, BenchError>;

    /// Execute one step: react to a fill and return the next fees.
    fn on_trade(&mut self, trade: &TradeObservation) -> Result<Fees, BenchError>;

    /// Independent copy with the same current state.
    fn box_clone(&self) -> Box<dyn StrategyInstance>;
}

impl Clone for Box<dyn StrategyInstance> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Source of fresh strategy instances, one pair per batch.
pub trait StrategyFactory: Send + Sync {
    fn create(&self) -> Box<dyn StrategyInstance>;

    fn name(&self) -> String {
        self.create().name().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
