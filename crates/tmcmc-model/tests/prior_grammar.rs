use tmcmc_core::{Prior, RngHandle, TmcmcError};
use tmcmc_model::{PriorDistribution, PriorSet};

#[test]
fn parses_every_family() {
    let uniform: PriorDistribution = "uniform 0 10".parse().unwrap();
    assert_eq!(uniform, PriorDistribution::Uniform { lower: 0.0, upper: 10.0 });

    let normal: PriorDistribution = "Normal 3 1".parse().unwrap();
    assert_eq!(normal, PriorDistribution::Normal { mu: 3.0, sigma: 1.0 });

    let lognormal: PriorDistribution = "lognormal 2 3".parse().unwrap();
    assert_eq!(lognormal, PriorDistribution::LogNormal { mu: 2.0, sigma: 3.0 });

    let truncated: PriorDistribution = "truncated_normal 3 1 0 2".parse().unwrap();
    assert_eq!(
        truncated,
        PriorDistribution::TruncatedNormal {
            mu: 3.0,
            sigma: 1.0,
            lower: 0.0,
            upper: 2.0
        }
    );
}

#[test]
fn unknown_name_is_a_config_error() {
    let err = "cauchy 0 1".parse::<PriorDistribution>().unwrap_err();
    assert!(matches!(err, TmcmcError::Config(_)));
    assert_eq!(err.info().code, "unknown-prior");
}

#[test]
fn missing_name_is_a_config_error() {
    let err = "   ".parse::<PriorDistribution>().unwrap_err();
    assert_eq!(err.info().code, "missing-prior");
}

#[test]
fn wrong_arity_and_bad_parameters_are_rejected() {
    for line in [
        "uniform 0",
        "normal 0 1 2",
        "truncated_normal 0 1",
        "uniform 5 1",
        "normal 0 -1",
        "lognormal 0 zero",
    ] {
        let err = line.parse::<PriorDistribution>().unwrap_err();
        assert_eq!(err.info().code, "invalid-prior", "line `{line}`");
    }
}

#[test]
fn samples_respect_support() {
    let priors: Vec<PriorDistribution> = [
        "uniform -1 4",
        "lognormal 0 0.5",
        "truncated_normal 3 1 0 2",
    ]
    .iter()
    .map(|line| line.parse().unwrap())
    .collect();
    let mut rng = RngHandle::from_seed(17);
    for prior in &priors {
        for _ in 0..2_000 {
            let value = prior.sample(&mut rng);
            assert!(prior.bounds().contains(value), "{prior}: {value}");
            assert!(prior.log_density(value).is_finite());
        }
    }
}

#[test]
fn log_densities_match_closed_forms() {
    let uniform = PriorDistribution::uniform(0.0, 5.0).unwrap();
    assert!((uniform.log_density(2.0) + 5f64.ln()).abs() < 1e-12);
    assert_eq!(uniform.log_density(5.5), f64::NEG_INFINITY);

    let normal = PriorDistribution::normal(0.0, 1.0).unwrap();
    let expected = -0.5 * (2.0 * std::f64::consts::PI).ln();
    assert!((normal.log_density(0.0) - expected).abs() < 1e-12);

    let lognormal = PriorDistribution::log_normal(0.0, 1.0).unwrap();
    assert!((lognormal.log_density(1.0) - expected).abs() < 1e-12);
    assert_eq!(lognormal.log_density(-1.0), f64::NEG_INFINITY);

    // Truncating at the mean keeps half of the mass.
    let half = PriorDistribution::truncated_normal(0.0, 1.0, 0.0, 50.0).unwrap();
    assert!((half.log_density(0.0) - (expected + 2f64.ln())).abs() < 1e-9);
}

#[test]
fn prior_set_sums_coordinates() {
    let set = PriorSet::new(vec![
        PriorDistribution::uniform(0.0, 2.0).unwrap(),
        PriorDistribution::uniform(0.0, 4.0).unwrap(),
    ]);
    assert_eq!(set.dimension(), 2);
    assert!((set.log_density(&[1.0, 1.0]) + 8f64.ln()).abs() < 1e-12);
    assert!(set.contains(&[1.0, 3.0]));
    assert!(!set.contains(&[1.0, 4.5]));
    let mut rng = RngHandle::from_seed(3);
    let point = set.sample_point(&mut rng);
    assert_eq!(point.len(), 2);
    assert!(set.contains(&point));
}

#[test]
fn priors_deserialize_from_yaml_lines() {
    let set: PriorSet = serde_yaml::from_str("- uniform 0 5\n- normal 1 2\n").unwrap();
    assert_eq!(set.dimension(), 2);
    let rendered = serde_yaml::to_string(&set).unwrap();
    assert!(rendered.contains("uniform 0 5"));

    let err = serde_yaml::from_str::<PriorSet>("- gamma 1 2\n").unwrap_err();
    assert!(err.to_string().contains("not recognised"));
}
