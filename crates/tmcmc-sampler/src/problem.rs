use std::fmt;
use std::sync::Arc;

use tmcmc_core::{LogLikelihood, TmcmcError};
use tmcmc_model::{GaussianLogLikelihood, ModelRegistry, ObservedData, PriorSet};

use crate::config::ModelConfig;

/// Priors plus log-likelihood: the posterior the sampler targets.
#[derive(Clone)]
pub struct Problem {
    priors: PriorSet,
    likelihood: Arc<dyn LogLikelihood>,
    model: String,
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("priors", &self.priors)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Problem {
    /// Wraps an arbitrary log-likelihood; `model` labels the run provenance.
    pub fn new(priors: PriorSet, likelihood: Arc<dyn LogLikelihood>, model: impl Into<String>) -> Self {
        Self {
            priors,
            likelihood,
            model: model.into(),
        }
    }

    /// Builds the Gaussian-error problem described by `config`.
    ///
    /// The observation noise is the scale of the configured error prior. The
    /// configuration is expected to have passed [`RunConfig::validate`].
    ///
    /// [`RunConfig::validate`]: crate::config::RunConfig::validate
    pub fn from_config(config: &ModelConfig, registry: &ModelRegistry) -> Result<Self, TmcmcError> {
        let model = registry.resolve(&config.model)?;
        let data = ObservedData::load(&config.data_file)?;
        let likelihood = GaussianLogLikelihood::new(
            model,
            data,
            config.error_prior.scale(),
            config.likelihood,
        );
        Ok(Self::new(
            PriorSet::new(config.priors.clone()),
            Arc::new(likelihood),
            config.model.clone(),
        ))
    }

    /// Joint prior.
    pub fn priors(&self) -> &PriorSet {
        &self.priors
    }

    /// Log-likelihood.
    pub fn likelihood(&self) -> &dyn LogLikelihood {
        self.likelihood.as_ref()
    }

    /// Label of the forward model.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Number of parameters.
    pub fn dimension(&self) -> usize {
        self.priors.dimension()
    }
}
