//! Adapter that executes a [`CompiledStrategy`] as a [`StrategyInstance`].

use std::sync::Arc;

use crate::strategy::compiler::CompiledStrategy;
use crate::strategy::{Fees, StrategyFactory, StrategyInstance, TradeObservation, TradeSide};
use crate::types::BenchError;

/// Running state of one compiled program.
///
/// After a fill, the hit side widens by `impact_bps` per 1% of the Y
/// reserve traded; all widening decays by `decay` on every fill.
#[derive(Debug, Clone)]
pub struct ProgramStrategy {
    program: Arc<CompiledStrategy>,
    bid_widening_bps: f64,
    ask_widening_bps: f64,
}

impl ProgramStrategy {
    pub fn new(program: Arc<CompiledStrategy>) -> Self {
        Self {
            program,
            bid_widening_bps: 0.0,
            ask_widening_bps: 0.0,
        }
    }

    fn current_fees(&self) -> Result<Fees, BenchError> {
        let p = &self.program;
        let bid = (p.bid_fee_bps + self.bid_widening_bps).min(p.max_fee_bps);
        let ask = (p.ask_fee_bps + self.ask_widening_bps).min(p.max_fee_bps);
        let fees = Fees::from_bps(bid, ask);
        fees
            .validate()
            .map_err(|message| BenchError::Strategy(format!("{}: {message}", p.name)))?;
        Ok(fees)
    }
}

impl StrategyInstance for ProgramStrategy {
    fn name(&self) -> &str {
        &self.program.name
    }

    fn reset(&mut self) {
        self.bid_widening_bps = 0.0;
        self.ask_widening_bps = 0.0;
    }

    fn initial_fees(&mut self, _reserve_x: f64, _reserve_y: f64) -> Result<Fees, BenchError> {
        self.current_fees()
    }

    fn on_trade(&mut self, trade: &TradeObservation) -> Result<Fees, BenchError> {
        let decay = self.program.decay;
        self.bid_widening_bps *= decay;
        self.ask_widening_bps *= decay;

        if self.program.impact_bps > 0.0 && trade.reserve_y > 0.0 {
            let traded_pct = trade.amount_y / trade.reserve_y * 100.0;
            let widening = self.program.impact_bps * traded_pct;
            match trade.side {
                TradeSide::Buy => self.ask_widening_bps += widening,
                TradeSide::Sell => self.bid_widening_bps += widening,
            }
        }

        self.current_fees()
    }

    fn box_clone(&self) -> Box<dyn StrategyInstance> {
        Box::new(self.clone())
    }
}

/// Creates fresh [`ProgramStrategy`] instances from one compiled program.
#[derive(Debug, Clone)]
pub struct CompiledStrategyFactory {
    program: Arc<CompiledStrategy>,
}

impl CompiledStrategyFactory {
    pub fn new(program: CompiledStrategy) -> Self {
        Self {
            program: Arc::new(program),
        }
    }
}

impl StrategyFactory for CompiledStrategyFactory {
    fn create(&self) -> Box<dyn StrategyInstance> {
        Box::new(ProgramStrategy::new(Arc::clone(&self.program)))
    }

    fn name(&self) -> String {
        self.program.name.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn widening_program() -> CompiledStrategy {
        CompiledStrategy {
            name: "Widening".into(),
            bid_fee_bps: 30.0,
            ask_fee_bps: 30.0,
            impact_bps: 10.0,
            decay: 0.5,
            max_fee_bps: 60.0,
        }
    }

    fn buy(amount_y: f64) -> TradeObservation {
        TradeObservation {
            step: 0,
            side: TradeSide::Buy,
            amount_x: amount_y / 100.0,
            amount_y,
            reserve_x: 100.0,
            reserve_y: 10_000.0,
        }
    }

    #[test]
    fn test_flat_program_is_constant() {
        let mut strat = ProgramStrategy::new(Arc::new(CompiledStrategy::flat("Flat", 30.0)));
        let initial = strat.initial_fees(100.0, 10_000.0).unwrap();
        let after = strat.on_trade(&buy(500.0)).unwrap();
        assert_eq!(initial, after);
        assert_eq!(initial, Fees::from_bps(30.0, 30.0));
    }

    #[test]
    fn test_widening_hits_one_side() {
        let mut strat = ProgramStrategy::new(Arc::new(widening_program()));
        // 100 Y on a 10_000 Y reserve = 1% -> +10 bps on the ask.
        let fees = strat.on_trade(&buy(100.0)).unwrap();
        assert!((fees.ask - 0.0040).abs() < 1e-12);
        assert!((fees.bid - 0.0030).abs() < 1e-12);
    }

    #[test]
    fn test_widening_decays_and_caps() {
        let mut strat = ProgramStrategy::new(Arc::new(widening_program()));
        let capped = strat.on_trade(&buy(1_000.0)).unwrap();
        assert!((capped.ask - 0.0060).abs() < 1e-12);

        // 100 bps widening halves on each zero-size fill: 50, 25, 12.5 ...
        let zero = buy(0.0);
        strat.on_trade(&zero).unwrap();
        let fees = strat.on_trade(&zero).unwrap();
        assert!((fees.ask - 0.0055).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut strat = ProgramStrategy::new(Arc::new(widening_program()));
        strat.on_trade(&buy(100.0)).unwrap();
        strat.reset();
        assert_eq!(strat.initial_fees(100.0, 10_000.0).unwrap(), Fees::from_bps(30.0, 30.0));
    }

    #[test]
    fn test_factory_instances_are_independent() {
        let factory = CompiledStrategyFactory::new(widening_program());
        let mut first = factory.create();
        let mut second = factory.create();
        first.on_trade(&buy(100.0)).unwrap();
        let untouched = second.initial_fees(100.0, 10_000.0).unwrap();
        assert_eq!(untouched, Fees::from_bps(30.0, 30.0));
        assert_eq!(factory.name(), "Widening");
    }

    #[test]
    fn test_box_clone_copies_state() {
        let mut strat: Box<dyn StrategyInstance> =
            Box::new(ProgramStrategy::new(Arc::new(widening_program())));
        strat.on_trade(&buy(100.0)).unwrap();
        let mut copy = strat.clone();
        let fees = copy.initial_fees(100.0, 10_000.0).unwrap();
        assert!((fees.ask - 0.0040).abs() < 1e-12);
    }
}
