use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::{LogLikelihood, TmcmcError};

use crate::data::ObservedData;
use crate::registry::ModelFunction;

/// Coefficients of the heteroscedastic error model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    /// Weight of the prediction-proportional term.
    #[serde(default)]
    pub alpha: f64,
    /// Constant noise floor.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Exponent applied to `|f(theta, x)|` in the proportional term.
    #[serde(default)]
    pub gamma: f64,
}

fn default_beta() -> f64 {
    1.0
}

impl Default for ErrorModel {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: default_beta(),
            gamma: 0.0,
        }
    }
}

impl ErrorModel {
    /// Rejects coefficients that leave some observation with zero variance.
    pub fn validate(&self) -> Result<(), TmcmcError> {
        let floor = if self.alpha != 0.0 && self.gamma == 0.0 {
            self.alpha + self.beta
        } else {
            self.beta
        };
        let finite = [self.alpha, self.beta, self.gamma]
            .iter()
            .all(|value| value.is_finite());
        if finite && floor != 0.0 {
            return Ok(());
        }
        Err(TmcmcError::Config(
            ErrorInfo::new("error-model", "error model yields zero observation variance")
                .with_context("alpha", self.alpha.to_string())
                .with_context("beta", self.beta.to_string())
                .with_context("gamma", self.gamma.to_string())
                .with_hint("use a non-zero beta, or alpha + beta != 0 when gamma = 0"),
        ))
    }

    /// Observation variance for a prediction `f` given the noise scale `sigma`.
    pub fn variance(&self, prediction: f64, sigma: f64) -> f64 {
        let spread = if self.alpha != 0.0 && self.gamma != 0.0 {
            self.alpha * prediction.abs().powf(self.gamma) + self.beta
        } else if self.alpha != 0.0 {
            self.alpha + self.beta
        } else {
            self.beta
        };
        (spread * sigma).powi(2)
    }
}

/// Independent Gaussian residuals around a forward model.
#[derive(Clone)]
pub struct GaussianLogLikelihood {
    model: Arc<dyn ModelFunction>,
    data: ObservedData,
    sigma: f64,
    errors: ErrorModel,
}

impl fmt::Debug for GaussianLogLikelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaussianLogLikelihood")
            .field("observations", &self.data.len())
            .field("sigma", &self.sigma)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl GaussianLogLikelihood {
    /// Couples a model with its data and noise description.
    pub fn new(
        model: Arc<dyn ModelFunction>,
        data: ObservedData,
        sigma: f64,
        errors: ErrorModel,
    ) -> Self {
        Self {
            model,
            data,
            sigma,
            errors,
        }
    }

    /// Observed data the likelihood is evaluated against.
    pub fn data(&self) -> &ObservedData {
        &self.data
    }
}

impl LogLikelihood for GaussianLogLikelihood {
    fn evaluate(&self, theta: &[f64]) -> f64 {
        self.data
            .iter()
            .map(|(x, y)| {
                let prediction = self.model.predict(theta, x);
                let variance = self.errors.variance(prediction, self.sigma);
                -(y - prediction).powi(2) / (2.0 * variance) - 0.5 * (2.0 * PI * variance).ln()
            })
            .sum()
    }
}
