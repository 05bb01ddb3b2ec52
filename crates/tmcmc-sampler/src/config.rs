use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::TmcmcError;
use tmcmc_model::{ErrorModel, PriorDistribution};

/// YAML document describing a full TMCMC run.
///
/// The `model` section covers the inference problem (model function, data,
/// priors, error model), the `sampler` section the algorithm parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Inference problem description.
    pub model: ModelConfig,
    /// Algorithm parameters.
    #[serde(default)]
    pub sampler: SamplerConfig,
}

/// Problem description: model, data, priors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of model parameters.
    pub dimension: usize,
    /// Registry name of the forward model.
    pub model: String,
    /// Two-column observed data table. Relative paths resolve against the config file.
    pub data_file: PathBuf,
    /// Error model coefficients.
    #[serde(default)]
    pub likelihood: ErrorModel,
    /// One prior line per model parameter.
    pub priors: Vec<PriorDistribution>,
    /// Prior whose scale sets the observation noise.
    pub error_prior: PriorDistribution,
}

/// Algorithm parameters for the stage loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Population size of every stage.
    #[serde(default = "default_pop_size")]
    pub pop_size: usize,
    /// Chain steps discarded before recording.
    #[serde(default)]
    pub burn_in: usize,
    /// Target coefficient of variation of the importance weights.
    #[serde(default = "default_tol_cov")]
    pub tol_cov: f64,
    /// Scaling applied to the stage covariance for proposals.
    #[serde(default = "default_bbeta")]
    pub bbeta: f64,
    /// Maximum number of stages, stage 0 included.
    #[serde(default = "default_max_stages")]
    pub max_stages: usize,
    /// Master seed; negative values select the built-in default seed.
    #[serde(default = "default_seed")]
    pub seed: i64,
    /// Optional per-stage population targets (padded with `pop_size`).
    #[serde(default)]
    pub stage_samples: Option<Vec<usize>>,
    /// Annealing exponent search settings.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Acceptance rule of the chain sampler.
    #[serde(default)]
    pub acceptance: AcceptanceRule,
    /// Redraw budget for proposals that leave the prior support.
    #[serde(default = "default_max_proposal_retries")]
    pub max_proposal_retries: usize,
    /// Output layout.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_pop_size() -> usize {
    1000
}

fn default_tol_cov() -> f64 {
    1.0
}

fn default_bbeta() -> f64 {
    0.2
}

fn default_max_stages() -> usize {
    20
}

fn default_seed() -> i64 {
    -1
}

fn default_max_proposal_retries() -> usize {
    10_000
}

/// Seed used when the configuration does not pin one.
pub const DEFAULT_MASTER_SEED: u64 = 0x05EE_D5EE_DD15_5EED_u64;

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            pop_size: default_pop_size(),
            burn_in: 0,
            tol_cov: default_tol_cov(),
            bbeta: default_bbeta(),
            max_stages: default_max_stages(),
            seed: default_seed(),
            stage_samples: None,
            optimizer: OptimizerConfig::default(),
            acceptance: AcceptanceRule::default(),
            max_proposal_retries: default_max_proposal_retries(),
            output: OutputConfig::default(),
        }
    }
}

impl SamplerConfig {
    /// Seed actually used for the run.
    pub fn master_seed(&self) -> u64 {
        if self.seed < 0 {
            DEFAULT_MASTER_SEED
        } else {
            self.seed as u64
        }
    }
}

/// Nelder-Mead settings for the annealing exponent search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Iteration budget.
    #[serde(default = "default_max_iter")]
    pub max_iter: u64,
    /// Convergence tolerance on the simplex objective spread.
    #[serde(default = "default_tol")]
    pub tol: f64,
    /// Forced increment is `0.1 * step` when the search stalls.
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_max_iter() -> u64 {
    1000
}

fn default_tol() -> f64 {
    1e-10
}

fn default_step() -> f64 {
    1e-5
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tol: default_tol(),
            step: default_step(),
        }
    }
}

/// How the chain sampler turns the log ratio `L` into a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcceptanceRule {
    /// Accept when `u < min(1, exp(L))`.
    #[default]
    Metropolis,
    /// Accept when `u < min(1, L)`, treating the log ratio as a probability.
    ClampedLog,
}

/// Output directory layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts. Nothing is written when unset.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// File name prefix of the per-stage dumps.
    #[serde(default = "default_stage_prefix")]
    pub stage_prefix: String,
    /// Manifest filename relative to `run_directory`.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
}

fn default_stage_prefix() -> String {
    "curgen_db_".to_string()
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            stage_prefix: default_stage_prefix(),
            manifest_file: default_manifest_filename(),
        }
    }
}

fn config_error(code: &str, message: impl Into<String>) -> TmcmcError {
    TmcmcError::Config(ErrorInfo::new(code, message))
}

impl RunConfig {
    /// Reads, parses and validates a YAML configuration.
    ///
    /// A relative `data_file` is rebased onto the directory holding the config.
    pub fn load(path: &Path) -> Result<Self, TmcmcError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            TmcmcError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let mut config = Self::from_yaml(&contents).map_err(|err| match err {
            TmcmcError::Config(info) => {
                TmcmcError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })?;
        if config.model.data_file.is_relative() {
            if let Some(parent) = path.parent() {
                config.model.data_file = parent.join(&config.model.data_file);
            }
        }
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, TmcmcError> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|err| config_error("config-parse", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field consistency.
    pub fn validate(&self) -> Result<(), TmcmcError> {
        let model = &self.model;
        let sampler = &self.sampler;
        if model.dimension == 0 {
            return Err(config_error("dimension", "model dimension must be positive"));
        }
        if model.priors.len() != model.dimension {
            return Err(TmcmcError::Config(
                ErrorInfo::new("prior-count", "one prior line is required per model parameter")
                    .with_context("dimension", model.dimension.to_string())
                    .with_context("priors", model.priors.len().to_string()),
            ));
        }
        model.likelihood.validate()?;
        if sampler.pop_size == 0 {
            return Err(config_error("pop-size", "pop_size must be positive"));
        }
        if sampler.max_stages == 0 {
            return Err(config_error("max-stages", "max_stages must be at least 1"));
        }
        if !(sampler.tol_cov > 0.0) {
            return Err(config_error("tol-cov", "tol_cov must be positive"));
        }
        if !(sampler.bbeta > 0.0) {
            return Err(config_error("bbeta", "bbeta must be positive"));
        }
        if !(sampler.optimizer.step > 0.0) || !(sampler.optimizer.tol >= 0.0) {
            return Err(config_error(
                "optimizer",
                "optimizer step must be positive and tol non-negative",
            ));
        }
        if sampler.max_proposal_retries == 0 {
            return Err(config_error(
                "proposal-retries",
                "max_proposal_retries must be at least 1",
            ));
        }
        if let Some(table) = &sampler.stage_samples {
            if let Some((stage, &target)) = table
                .iter()
                .enumerate()
                .find(|(_, &target)| target == 0 || target > sampler.pop_size)
            {
                return Err(TmcmcError::Config(
                    ErrorInfo::new("stage-samples", "stage targets must lie in 1..=pop_size")
                        .with_context("stage", stage.to_string())
                        .with_context("target", target.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Immutable, resolved algorithm parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Problem dimension.
    pub dimension: usize,
    /// Population size; the generation store holds `pop_size + 1` entries.
    pub pop_size: usize,
    /// Population target per stage, `max_stages` entries.
    pub stage_targets: Vec<usize>,
    /// Stage budget, stage 0 included.
    pub max_stages: usize,
    /// Chain steps discarded before recording.
    pub burn_in: usize,
    /// Target coefficient of variation.
    pub tol_cov: f64,
    /// Proposal covariance scaling.
    pub bbeta: f64,
    /// Exponent search settings.
    pub optimizer: OptimizerConfig,
    /// Chain acceptance rule.
    pub acceptance: AcceptanceRule,
    /// Redraw budget for out-of-support proposals.
    pub max_proposal_retries: usize,
    /// Master seed.
    pub seed: u64,
    /// Error model coefficients.
    pub error_model: ErrorModel,
}

impl Parameters {
    /// Resolves the validated configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        let sampler = &config.sampler;
        let mut stage_targets = sampler.stage_samples.clone().unwrap_or_default();
        stage_targets.resize(sampler.max_stages.max(stage_targets.len()), sampler.pop_size);
        stage_targets.truncate(sampler.max_stages);
        Self {
            dimension: config.model.dimension,
            pop_size: sampler.pop_size,
            stage_targets,
            max_stages: sampler.max_stages,
            burn_in: sampler.burn_in,
            tol_cov: sampler.tol_cov,
            bbeta: sampler.bbeta,
            optimizer: sampler.optimizer.clone(),
            acceptance: sampler.acceptance,
            max_proposal_retries: sampler.max_proposal_retries,
            seed: sampler.master_seed(),
            error_model: config.model.likelihood,
        }
    }

    /// Population target of `stage`; stages past the table use `pop_size`.
    pub fn stage_target(&self, stage: usize) -> usize {
        self.stage_targets.get(stage).copied().unwrap_or(self.pop_size)
    }

    /// Capacity of the generation store.
    pub fn store_capacity(&self) -> usize {
        self.pop_size + 1
    }
}
