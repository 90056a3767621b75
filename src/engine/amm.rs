//! Constant-product pool with fee-on-input.
//!
//! Fees stay in the pool, so `x * y` only grows. A pool's edge is the
//! value of what it received minus the value of what it paid out, both
//! marked at the fair price at the time of the fill.

use crate::strategy::{Fees, TradeSide};

/// Trades smaller than this (in either asset) are ignored.
const DUST: f64 = 1e-12;

/// One executed fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub side: TradeSide,
    pub amount_x: f64,
    pub amount_y: f64,
    /// Fair-value gain of the pool on this fill.
    pub edge: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pub reserve_x: f64,
    pub reserve_y: f64,
    pub fees: Fees,
    /// Accumulated fair-value edge.
    pub edge: f64,
}

impl Pool {
    pub fn new(reserve_x: f64, reserve_y: f64, fees: Fees) -> Self {
        Self {
            reserve_x,
            reserve_y,
            fees,
            edge: 0.0,
        }
    }

    /// Marginal price of X in Y, ignoring fees.
    pub fn spot_price(&self) -> f64 {
        self.reserve_y / self.reserve_x
    }

    fn invariant(&self) -> f64 {
        self.reserve_x * self.reserve_y
    }

    /// X received for paying `amount_y` in.
    pub fn quote_buy(&self, amount_y: f64) -> f64 {
        let effective = (1.0 - self.fees.ask) * amount_y;
        self.reserve_x * effective / (self.reserve_y + effective)
    }

    /// Y received for paying `amount_x` in.
    pub fn quote_sell(&self, amount_x: f64) -> f64 {
        let effective = (1.0 - self.fees.bid) * amount_x;
        self.reserve_y * effective / (self.reserve_x + effective)
    }

    /// Trader pays `amount_y`, receives X.
    pub fn buy(&mut self, amount_y: f64, fair_price: f64) -> Option<Fill> {
        let amount_x = self.quote_buy(amount_y);
        if amount_y < DUST || amount_x < DUST {
            return None;
        }
        self.reserve_y += amount_y;
        self.reserve_x -= amount_x;
        Some(self.settle(TradeSide::Buy, amount_x, amount_y, amount_y - fair_price * amount_x))
    }

    /// Trader pays `amount_x`, receives Y.
    pub fn sell(&mut self, amount_x: f64, fair_price: f64) -> Option<Fill> {
        let amount_y = self.quote_sell(amount_x);
        if amount_x < DUST || amount_y < DUST {
            return None;
        }
        self.reserve_x += amount_x;
        self.reserve_y -= amount_y;
        Some(self.settle(TradeSide::Sell, amount_x, amount_y, fair_price * amount_x - amount_y))
    }

    /// Trade the pool to the fee-adjusted fair price, if profitable for the arbitrageur.
    pub fn arbitrage(&mut self, fair_price: f64) -> Option<Fill> {
        let k = self.invariant();
        let spot = self.spot_price();

        let gamma_ask = 1.0 - self.fees.ask;
        if gamma_ask * fair_price > spot {
            // Pool is cheap: buy X until the marginal cost reaches fair.
            let target_y = (k * gamma_ask * fair_price).sqrt();
            let amount_y = (target_y - self.reserve_y) / gamma_ask;
            return self.buy(amount_y, fair_price);
        }

        let gamma_bid = 1.0 - self.fees.bid;
        if spot * gamma_bid > fair_price {
            // Pool is rich: sell X until the marginal proceeds fall to fair.
            let target_x = (k * gamma_bid / fair_price).sqrt();
            let amount_x = (target_x - self.reserve_x) / gamma_bid;
            return self.sell(amount_x, fair_price);
        }

        None
    }

    fn settle(&mut self, side: TradeSide, amount_x: f64, amount_y: f64, edge: f64) -> Fill {
        self.edge += edge;
        Fill {
            side,
            amount_x,
            amount_y,
            edge,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
