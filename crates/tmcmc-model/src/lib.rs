#![deny(missing_docs)]

//! Priors, observed data and likelihood models consumed by the TMCMC sampler.
//!
//! Everything here sits behind the two capability traits of `tmcmc-core`
//! ([`tmcmc_core::Prior`] and [`tmcmc_core::LogLikelihood`]); the sampler never
//! inspects a prior family or a model name directly.

/// Two-column observed data tables.
pub mod data;
/// Gaussian error-model log-likelihood.
pub mod likelihood;
/// Prior families and the prior-line grammar.
pub mod priors;
/// Named model functions resolved at construction time.
pub mod registry;

pub use data::ObservedData;
pub use likelihood::{ErrorModel, GaussianLogLikelihood};
pub use priors::{PriorDistribution, PriorSet};
pub use registry::{ModelFunction, ModelRegistry};
