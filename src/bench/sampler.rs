//! Hyperparameter variance sampler.
//!
//! Resolves the randomised hyperparameters of one simulation from its seed.
//! The draw is a pure function of `(seed, nominal, variance)` so any single
//! simulation can be reproduced and audited after the fact.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{HyperparameterRange, NominalConfig, ResolvedHyperparameters, VarianceSpec};

/// Draw the per-simulation hyperparameters for `seed`.
///
/// One RNG is seeded with exactly `seed` and consumed in a fixed order:
/// retail mean size, retail arrival rate, gbm sigma. Hyperparameters that
/// do not vary take their nominal value and consume no draw.
///
/// # Panics
///
/// Panics on a varied range that [`VarianceSpec::validate`] rejects
/// (inverted, non-finite, or wider than `f64::MAX`). Callers validate
/// before sampling.
pub fn sample(seed: u64, nominal: &NominalConfig, variance: &VarianceSpec) -> ResolvedHyperparameters {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let retail_mean_size = resolve(&mut rng, &variance.retail_mean_size, nominal.retail_mean_size);
    let retail_arrival_rate =
        resolve(&mut rng, &variance.retail_arrival_rate, nominal.retail_arrival_rate);
    let gbm_sigma = resolve(&mut rng, &variance.gbm_sigma, nominal.gbm_sigma);

    ResolvedHyperparameters {
        retail_mean_size,
        retail_arrival_rate,
        gbm_sigma,
    }
}

fn resolve(rng: &mut ChaCha8Rng, range: &HyperparameterRange, nominal: f64) -> f64 {
    if range.vary {
        rng.gen_range(range.min..=range.max)
    } else {
        nominal
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_deterministic() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec::default();

        for seed in [0, 1, 42, 10_000, u64::MAX] {
            let first = sample(seed, &nominal, &variance);
            let second = sample(seed, &nominal, &variance);
            assert_eq!(first.retail_mean_size.to_bits(), second.retail_mean_size.to_bits());
            assert_eq!(first.retail_arrival_rate.to_bits(), second.retail_arrival_rate.to_bits());
            assert_eq!(first.gbm_sigma.to_bits(), second.gbm_sigma.to_bits());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec::default();
        let a = sample(1, &nominal, &variance);
        let b = sample(2, &nominal, &variance);
        assert!(a.retail_mean_size != b.retail_mean_size || a.gbm_sigma != b.gbm_sigma);
    }

    #[test]
    fn test_fixed_variance_passes_nominal_through() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec::fixed();

        for seed in 0..500 {
            let hyper = sample(seed, &nominal, &variance);
            assert_eq!(hyper.retail_mean_size, nominal.retail_mean_size);
            assert_eq!(hyper.retail_arrival_rate, nominal.retail_arrival_rate);
            assert_eq!(hyper.gbm_sigma, nominal.gbm_sigma);
        }
    }

    #[test]
    fn test_varied_values_stay_within_bounds() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec::default();

        for seed in 0..10_000 {
            let hyper = sample(seed, &nominal, &variance);
            let size = &variance.retail_mean_size;
            let rate = &variance.retail_arrival_rate;
            let sigma = &variance.gbm_sigma;
            assert!(hyper.retail_mean_size >= size.min && hyper.retail_mean_size <= size.max);
            assert!(hyper.retail_arrival_rate >= rate.min && hyper.retail_arrival_rate <= rate.max);
            assert!(hyper.gbm_sigma >= sigma.min && hyper.gbm_sigma <= sigma.max);
        }
    }

    #[test]
    fn test_partial_variance() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec {
            retail_mean_size: HyperparameterRange::fixed(),
            retail_arrival_rate: HyperparameterRange::varied(0.1, 0.2),
            gbm_sigma: HyperparameterRange::fixed(),
        };

        for seed in 0..1_000 {
            let hyper = sample(seed, &nominal, &variance);
            assert_eq!(hyper.retail_mean_size, nominal.retail_mean_size);
            assert_eq!(hyper.gbm_sigma, nominal.gbm_sigma);
            assert!((0.1..=0.2).contains(&hyper.retail_arrival_rate));
        }
    }

    #[test]
    fn test_degenerate_range_returns_bound() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec {
            gbm_sigma: HyperparameterRange::varied(0.002, 0.002),
            ..VarianceSpec::fixed()
        };
        assert_eq!(sample(9, &nominal, &variance).gbm_sigma, 0.002);
    }

    #[test]
    fn test_widest_accepted_range_samples() {
        let nominal = NominalConfig::default();
        let variance = VarianceSpec {
            retail_mean_size: HyperparameterRange::varied(-1.0e307, 1.0e307),
            ..VarianceSpec::fixed()
        };
        assert!(variance.validate().is_ok());
        for seed in 0..100 {
            let size = sample(seed, &nominal, &variance).retail_mean_size;
            assert!((-1.0e307..=1.0e307).contains(&size));
        }
    }
}
