use proptest::prelude::*;
use tmcmc_core::{Prior, RngHandle};
use tmcmc_model::PriorDistribution;

#[test]
fn upper_tail_truncation_keeps_finite_density() {
    let upper = PriorDistribution::truncated_normal(0.0, 1.0, 9.0, 10.0).unwrap();
    let lower = PriorDistribution::truncated_normal(0.0, 1.0, -10.0, -9.0).unwrap();
    let density = upper.log_density(9.2);
    assert!(density.is_finite());
    assert!((density - lower.log_density(-9.2)).abs() < 1e-9);

    let mut rng = RngHandle::from_seed(17);
    let draws: Vec<f64> = (0..512).map(|_| upper.sample(&mut rng)).collect();
    assert!(draws.iter().all(|value| (9.0..=10.0).contains(value)));
    let mean = draws.iter().sum::<f64>() / draws.len() as f64;
    // Mean of N(0,1) truncated to [9, 10] is about 9.108.
    assert!((mean - 9.108).abs() < 0.03, "mean = {mean}");
    assert!(draws.iter().filter(|value| **value == 10.0).count() < 5);
}

proptest! {
    #[test]
    fn truncated_normal_draws_stay_inside(seed in any::<u64>(), mu in -5.0f64..5.0, sigma in 0.1f64..3.0, lower in -4.0f64..6.0, width in 0.1f64..4.0) {
        let prior = PriorDistribution::truncated_normal(mu, sigma, lower, lower + width).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        for _ in 0..64 {
            let value = prior.sample(&mut rng);
            prop_assert!(value >= lower && value <= lower + width);
            prop_assert!(prior.log_density(value).is_finite());
        }
    }

    #[test]
    fn density_vanishes_outside_support(lower in -10.0f64..10.0, width in 0.1f64..5.0, offset in 0.01f64..5.0) {
        let prior = PriorDistribution::uniform(lower, lower + width).unwrap();
        prop_assert_eq!(prior.log_density(lower - offset), f64::NEG_INFINITY);
        prop_assert_eq!(prior.log_density(lower + width + offset), f64::NEG_INFINITY);
        prop_assert!((prior.log_density(lower + width / 2.0) + width.ln()).abs() < 1e-12);
    }
}
