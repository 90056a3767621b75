//! Exogenous market processes: the fair price path and retail order flow.

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Poisson, StandardNormal};

use crate::strategy::TradeSide;
use crate::types::{BenchError, SimulationConfig};

// ---------------------------------------------------------------------------
// Fair price
// ---------------------------------------------------------------------------

/// Geometric Brownian motion for the fair price of X in Y.
#[derive(Debug, Clone)]
pub struct PriceProcess {
    price: f64,
    drift: f64,
    diffusion: f64,
}

impl PriceProcess {
    pub fn new(config: &SimulationConfig) -> Self {
        let sigma = config.gbm_sigma;
        let dt = config.gbm_dt;
        Self {
            price: config.initial_price,
            drift: (config.gbm_mu - 0.5 * sigma * sigma) * dt,
            diffusion: sigma * dt.sqrt(),
        }
    }

    /// Advance one step and return the new price.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        self.price *= (self.drift + self.diffusion * z).exp();
        self.price
    }
}

// ---------------------------------------------------------------------------
// Retail flow
// ---------------------------------------------------------------------------

/// A retail order, sized in Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetailOrder {
    pub side: TradeSide,
    pub size_y: f64,
}

/// Poisson arrivals with log-normal sizes.
#[derive(Debug, Clone)]
pub struct RetailFlow {
    arrivals: Option<Poisson<f64>>,
    sizes: Option<LogNormal<f64>>,
    buy_prob: f64,
}

impl RetailFlow {
    pub fn new(config: &SimulationConfig) -> Result<Self, BenchError> {
        let invalid = |what: &str, e: &dyn std::fmt::Display| BenchError::Simulation {
            seed: config.seed,
            message: format!("invalid {what}: {e}"),
        };

        let arrivals = if config.retail_arrival_rate > 0.0 {
            Some(Poisson::new(config.retail_arrival_rate).map_err(|e| invalid("arrival rate", &e))?)
        } else {
            None
        };

        // Log-normal with mean `retail_mean_size`: mu = ln(mean) - sigma^2 / 2.
        let sizes = if config.retail_mean_size > 0.0 {
            let sigma = config.retail_size_sigma;
            let mu = config.retail_mean_size.ln() - 0.5 * sigma * sigma;
            Some(LogNormal::new(mu, sigma).map_err(|e| invalid("size distribution", &e))?)
        } else {
            None
        };

        Ok(Self {
            arrivals,
            sizes,
            buy_prob: config.retail_buy_prob,
        })
    }

    /// Orders arriving during one step.
    pub fn orders<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<RetailOrder> {
        let (Some(arrivals), Some(sizes)) = (&self.arrivals, &self.sizes) else {
            return Vec::new();
        };

        let count = arrivals.sample(rng) as usize;
        (0..count)
            .map(|_| {
                let side = if rng.gen::<f64>() < self.buy_prob {
                    TradeSide::Buy
                } else {
                    TradeSide::Sell
                };
                RetailOrder {
                    side,
                    size_y: sizes.sample(rng),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
