//! Scripted batch runner for integration testing.
//!
//! Returns a known edge per simulation, records every batch it is handed
//! and can be told to fail on a given seed offset. All state is in-memory.

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

use seedbench::engine::BatchRunner;
use seedbench::strategy::StrategyInstance;
use seedbench::types::{BenchError, MatchResult, SimulationConfig};

/// A batch runner whose results are fully controlled from test code.
#[derive(Clone)]
pub struct ScriptedRunner {
    /// Edge credited to strategy A for every simulation.
    edge_per_sim: Decimal,
    /// Seeds of every batch received, in call order.
    batches: Arc<Mutex<Vec<Vec<u64>>>>,
    /// Strategy names seen on each call.
    contestants: Arc<Mutex<Vec<(String, String)>>>,
    /// Batches starting at this seed fail.
    fail_at: Arc<Mutex<Option<u64>>>,
}

impl ScriptedRunner {
    pub fn new(edge_per_sim: Decimal) -> Self {
        Self {
            edge_per_sim,
            batches: Arc::new(Mutex::new(Vec::new())),
            contestants: Arc::new(Mutex::new(Vec::new())),
            fail_at: Arc::new(Mutex::new(None)),
        }
    }

    /// Fail the batch whose first seed is `seed_offset`.
    pub fn fail_at(&self, seed_offset: u64) {
        *self.fail_at.lock().unwrap() = Some(seed_offset);
    }

    /// Seeds of every batch run so far.
    pub fn batches(&self) -> Vec<Vec<u64>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn contestants(&self) -> Vec<(String, String)> {
        self.contestants.lock().unwrap().clone()
    }
}

impl BatchRunner for ScriptedRunner {
    fn run_match(
        &self,
        strategy_a: &dyn StrategyInstance,
        strategy_b: &dyn StrategyInstance,
        configs: &[SimulationConfig],
    ) -> Result<MatchResult, BenchError> {
        let seeds: Vec<u64> = configs.iter().map(|c| c.seed).collect();
        self.batches.lock().unwrap().push(seeds.clone());
        self.contestants
            .lock()
            .unwrap()
            .push((strategy_a.name().to_string(), strategy_b.name().to_string()));

        if let (Some(fail), Some(&first)) = (*self.fail_at.lock().unwrap(), seeds.first()) {
            if fail == first {
                return Err(BenchError::Simulation {
                    seed: first,
                    message: "scripted failure".into(),
                });
            }
        }

        let mut result = MatchResult::default();
        for _ in configs {
            result.record(self.edge_per_sim);
        }
        Ok(result)
    }
}
