#![deny(missing_docs)]
#![doc = "Core traits and data types shared by the TMCMC crates."]

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, TmcmcError};
pub use rng::{derive_substream_seed, RngHandle};

/// Ordered parameter vector of the problem dimension.
pub type ParameterVector = Vec<f64>;

/// Support of a one dimensional prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive lower bound (may be `-inf`).
    pub lower: f64,
    /// Inclusive upper bound (may be `+inf`).
    pub upper: f64,
}

impl Bounds {
    /// Creates a new support descriptor.
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Unbounded support on the real line.
    pub const fn real_line() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Returns whether `value` lies inside the support.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Capability set of a one dimensional prior distribution.
pub trait Prior: Send + Sync {
    /// Draws a value from the prior.
    fn sample(&self, rng: &mut RngHandle) -> f64;

    /// Returns the log density at `value` (`-inf` outside the support).
    fn log_density(&self, value: f64) -> f64;

    /// Returns the support of the prior.
    fn bounds(&self) -> Bounds;
}

/// Log-likelihood of a parameter vector given the observed data.
pub trait LogLikelihood: Send + Sync {
    /// Evaluates the log-likelihood of `theta`.
    fn evaluate(&self, theta: &[f64]) -> f64;
}

impl<F> LogLikelihood for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, theta: &[f64]) -> f64 {
        self(theta)
    }
}
