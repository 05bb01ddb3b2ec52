use std::fs;

use tempfile::tempdir;
use tmcmc_core::TmcmcError;
use tmcmc_sampler::config::DEFAULT_MASTER_SEED;
use tmcmc_sampler::{AcceptanceRule, Parameters, RunConfig};

const MINIMAL: &str = r#"
model:
  dimension: 2
  model: affine
  data_file: obs.txt
  priors:
    - uniform -1 1
    - normal 0 2
  error_prior: uniform 0 1
"#;

fn config_code(err: TmcmcError) -> String {
    match err {
        TmcmcError::Config(info) => info.code,
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn minimal_document_uses_defaults() {
    let config = RunConfig::from_yaml(MINIMAL).unwrap();
    let sampler = &config.sampler;
    assert_eq!(sampler.pop_size, 1000);
    assert_eq!(sampler.burn_in, 0);
    assert_eq!(sampler.tol_cov, 1.0);
    assert_eq!(sampler.bbeta, 0.2);
    assert_eq!(sampler.max_stages, 20);
    assert_eq!(sampler.optimizer.max_iter, 1000);
    assert_eq!(sampler.optimizer.tol, 1e-10);
    assert_eq!(sampler.optimizer.step, 1e-5);
    assert_eq!(sampler.acceptance, AcceptanceRule::Metropolis);
    assert_eq!(sampler.output.stage_prefix, "curgen_db_");
    assert_eq!(sampler.master_seed(), DEFAULT_MASTER_SEED);
    assert_eq!(config.model.likelihood.beta, 1.0);
}

#[test]
fn sampler_section_overrides() {
    let yaml = format!(
        "{MINIMAL}sampler:\n  pop_size: 50\n  seed: 12\n  acceptance: clamped-log\n  stage_samples: [20, 30]\n  max_stages: 4\n"
    );
    let config = RunConfig::from_yaml(&yaml).unwrap();
    let params = Parameters::from_config(&config);
    assert_eq!(params.seed, 12);
    assert_eq!(params.acceptance, AcceptanceRule::ClampedLog);
    assert_eq!(params.stage_targets, vec![20, 30, 50, 50]);
    assert_eq!(params.stage_target(9), 50);
}

#[test]
fn invalid_documents_are_rejected() {
    let cases = [
        (MINIMAL.replace("dimension: 2", "dimension: 3"), "prior-count"),
        (MINIMAL.replace("dimension: 2", "dimension: 0"), "dimension"),
        (format!("{MINIMAL}sampler:\n  pop_size: 0\n"), "pop-size"),
        (format!("{MINIMAL}sampler:\n  tol_cov: -1\n"), "tol-cov"),
        (format!("{MINIMAL}sampler:\n  bbeta: 0\n"), "bbeta"),
        (format!("{MINIMAL}sampler:\n  max_stages: 0\n"), "max-stages"),
        (
            format!("{MINIMAL}sampler:\n  pop_size: 10\n  stage_samples: [5, 11]\n"),
            "stage-samples",
        ),
        (MINIMAL.replace("normal 0 2", "cauchy 0 2"), "config-parse"),
        (format!("{MINIMAL}  likelihood:\n    beta: 0\n"), "error-model"),
        (
            format!("{MINIMAL}  likelihood:\n    alpha: -1\n    beta: 1\n"),
            "error-model",
        ),
    ];
    for (yaml, code) in cases {
        assert_eq!(config_code(RunConfig::from_yaml(&yaml).unwrap_err()), code);
    }
}

#[test]
fn data_file_resolves_next_to_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.yaml");
    fs::write(&path, MINIMAL).unwrap();
    let config = RunConfig::load(&path).unwrap();
    assert_eq!(config.model.data_file, dir.path().join("obs.txt"));

    let missing = RunConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(config_code(missing), "config-read");
}
