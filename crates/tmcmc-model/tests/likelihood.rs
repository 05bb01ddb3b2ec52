use std::f64::consts::PI;

use tmcmc_core::{LogLikelihood, TmcmcError};
use tmcmc_model::{ErrorModel, GaussianLogLikelihood, ModelFunction, ModelRegistry, ObservedData};

fn linear_data() -> ObservedData {
    ObservedData::from_pairs((1..=5).map(|x| (x as f64, 2.0 * x as f64)).collect()).unwrap()
}

#[test]
fn constant_noise_floor_matches_closed_form() {
    let registry = ModelRegistry::with_builtins();
    let model = registry.resolve("linear").unwrap();
    let errors = ErrorModel {
        alpha: 0.0,
        beta: 2.0,
        gamma: 0.0,
    };
    let likelihood = GaussianLogLikelihood::new(model, linear_data(), 0.5, errors);

    let variance: f64 = 1.0; // (beta * sigma)^2
    let at_truth = likelihood.evaluate(&[2.0]);
    assert!((at_truth - 5.0 * -0.5 * (2.0 * PI * variance).ln()).abs() < 1e-12);

    // Residuals x_t for theta = 1: sum of x^2 = 55.
    let off = likelihood.evaluate(&[1.0]);
    assert!((at_truth - off - 55.0 / 2.0).abs() < 1e-9);
}

#[test]
fn error_model_branches() {
    let proportional = ErrorModel {
        alpha: 0.5,
        beta: 1.0,
        gamma: 1.0,
    };
    assert!((proportional.variance(4.0, 1.0) - 9.0).abs() < 1e-12);

    let additive = ErrorModel {
        alpha: 0.5,
        beta: 1.0,
        gamma: 0.0,
    };
    assert!((additive.variance(4.0, 2.0) - 9.0).abs() < 1e-12);

    let floor = ErrorModel::default();
    assert!((floor.variance(123.0, 3.0) - 9.0).abs() < 1e-12);
}

#[test]
fn registry_resolves_builtins_and_custom_models() {
    let mut registry = ModelRegistry::with_builtins();
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, vec!["affine", "exponential", "linear", "polynomial"]);

    registry.register("square", |theta: &[f64], x: f64| theta[0] * x * x);
    let square = registry.resolve("square").unwrap();
    assert_eq!(square.predict(&[3.0], 2.0), 12.0);

    let affine = registry.resolve("affine").unwrap();
    assert_eq!(affine.predict(&[1.0, 2.0], 3.0), 7.0);
}

#[test]
fn unknown_model_is_fatal() {
    let registry = ModelRegistry::with_builtins();
    let Err(err) = registry.resolve("does_not_exist") else {
        panic!("unknown model names must not resolve");
    };
    assert!(matches!(err, TmcmcError::Model(_)));
    assert!(err.info().hint.as_deref().unwrap_or("").contains("linear"));
}

#[test]
fn zero_variance_error_models_are_rejected() {
    let degenerate = [
        ErrorModel {
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
        },
        ErrorModel {
            alpha: 2.0,
            beta: -2.0,
            gamma: 0.0,
        },
        ErrorModel {
            alpha: 1.0,
            beta: 0.0,
            gamma: 1.0,
        },
    ];
    for errors in degenerate {
        let err = errors.validate().unwrap_err();
        assert!(matches!(err, TmcmcError::Config(_)));
        assert_eq!(err.info().code, "error-model");
    }
    ErrorModel::default().validate().unwrap();
    ErrorModel {
        alpha: 0.5,
        beta: 1.0,
        gamma: 1.0,
    }
    .validate()
    .unwrap();
}
