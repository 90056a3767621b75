//! Reference match engine.
//!
//! Runs the simulations of a batch in parallel on a dedicated rayon pool.
//! Each simulation pits two constant-product pools against each other
//! under the same fair-price path and retail flow:
//!
//! 1. the fair price takes one GBM step,
//! 2. an arbitrageur trades each pool back inside its fee band,
//! 3. retail orders arrive and route to the pool quoting the better output.
//!
//! After every fill the owning strategy sets the pool's next fees.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::engine::amm::{Fill, Pool};
use crate::engine::market::{PriceProcess, RetailFlow, RetailOrder};
use crate::engine::BatchRunner;
use crate::strategy::{StrategyInstance, TradeObservation, TradeSide};
use crate::types::{BenchError, MatchResult, SimulationConfig};

/// Decimal places kept from each simulation's edge.
const EDGE_DECIMALS: u32 = 12;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct MatchEngine {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl MatchEngine {
    /// Build an engine backed by `workers` threads.
    pub fn new(workers: usize) -> Result<Self, BenchError> {
        if workers == 0 {
            return Err(BenchError::Config("worker count must be at least 1".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("seedbench-worker-{i}"))
            .build()
            .map_err(|e| BenchError::Config(format!("failed to build worker pool: {e}")))?;

        info!(workers, "Match engine ready");
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl BatchRunner for MatchEngine {
    fn run_match(
        &self,
        strategy_a: &dyn StrategyInstance,
        strategy_b: &dyn StrategyInstance,
        configs: &[SimulationConfig],
    ) -> Result<MatchResult, BenchError> {
        self.pool.install(|| {
            configs
                .par_iter()
                .map(|config| -> Result<MatchResult, BenchError> {
                    let edge = simulate(config, strategy_a, strategy_b)?;
                    let mut partial = MatchResult::default();
                    partial.record(edge);
                    Ok(partial)
                })
                .try_reduce(MatchResult::default, |left, right| Ok(left.merge(right)))
        })
    }
}

// ---------------------------------------------------------------------------
// Single simulation
// ---------------------------------------------------------------------------

/// One side of a simulation: a pool and the strategy that prices it.
struct Contestant {
    pool: Pool,
    strategy: Box<dyn StrategyInstance>,
}

impl Contestant {
    fn new(template: &dyn StrategyInstance, config: &SimulationConfig) -> Result<Self, BenchError> {
        let mut strategy = template.box_clone();
        strategy.reset();
        let fees = strategy.initial_fees(config.initial_x, config.initial_y)?;
        fees.validate().map_err(BenchError::Strategy)?;
        Ok(Self {
            pool: Pool::new(config.initial_x, config.initial_y, fees),
            strategy,
        })
    }

    /// Let the strategy react to a fill on its pool.
    fn observe(&mut self, step: u32, fill: Fill) -> Result<(), BenchError> {
        let trade = TradeObservation {
            step,
            side: fill.side,
            amount_x: fill.amount_x,
            amount_y: fill.amount_y,
            reserve_x: self.pool.reserve_x,
            reserve_y: self.pool.reserve_y,
        };
        let fees = self.strategy.on_trade(&trade)?;
        fees.validate().map_err(BenchError::Strategy)?;
        self.pool.fees = fees;
        Ok(())
    }

    fn arbitrage(&mut self, step: u32, fair_price: f64) -> Result<(), BenchError> {
        match self.pool.arbitrage(fair_price) {
            Some(fill) => self.observe(step, fill),
            None => Ok(()),
        }
    }

    /// Fill an order worth `size_y` at the current fair price.
    fn fill(&mut self, step: u32, side: TradeSide, size_y: f64, fair_price: f64) -> Result<(), BenchError> {
        let fill = match side {
            TradeSide::Buy => self.pool.buy(size_y, fair_price),
            TradeSide::Sell => self.pool.sell(size_y / fair_price, fair_price),
        };
        match fill {
            Some(fill) => self.observe(step, fill),
            None => Ok(()),
        }
    }

    /// Output this pool would give for the whole order.
    fn quote(&self, order: &RetailOrder, fair_price: f64) -> f64 {
        match order.side {
            TradeSide::Buy => self.pool.quote_buy(order.size_y),
            TradeSide::Sell => self.pool.quote_sell(order.size_y / fair_price),
        }
    }
}

/// Run one simulation and return the edge of A over B.
pub fn simulate(
    config: &SimulationConfig,
    strategy_a: &dyn StrategyInstance,
    strategy_b: &dyn StrategyInstance,
) -> Result<Decimal, BenchError> {
    let seed = config.seed;
    run_simulation(config, strategy_a, strategy_b).map_err(|e| match e {
        BenchError::Simulation { .. } => e,
        other => BenchError::Simulation { seed, message: other.to_string() },
    })
}

fn run_simulation(
    config: &SimulationConfig,
    strategy_a: &dyn StrategyInstance,
    strategy_b: &dyn StrategyInstance,
) -> Result<Decimal, BenchError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut price = PriceProcess::new(config);
    let retail = RetailFlow::new(config)?;

    let mut a = Contestant::new(strategy_a, config)?;
    let mut b = Contestant::new(strategy_b, config)?;

    for step in 0..config.n_steps {
        let fair = price.step(&mut rng);

        a.arbitrage(step, fair)?;
        b.arbitrage(step, fair)?;

        for order in retail.orders(&mut rng) {
            let quote_a = a.quote(&order, fair);
            let quote_b = b.quote(&order, fair);
            if quote_a > quote_b {
                a.fill(step, order.side, order.size_y, fair)?;
            } else if quote_b > quote_a {
                b.fill(step, order.side, order.size_y, fair)?;
            } else {
                let half = order.size_y / 2.0;
                a.fill(step, order.side, half, fair)?;
                b.fill(step, order.side, half, fair)?;
            }
        }
    }

    let edge = a.pool.edge - b.pool.edge;
    debug!(config = %config, edge_a = a.pool.edge, edge_b = b.pool.edge, "Simulation complete");

    // Fixed scale: batch totals are exact whatever order workers finish in.
    Decimal::from_f64_retain(edge)
        .map(|e| e.round_dp(EDGE_DECIMALS))
        .ok_or_else(|| BenchError::Simulation {
            seed: config.seed,
            message: format!("edge is not representable: {edge}"),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
