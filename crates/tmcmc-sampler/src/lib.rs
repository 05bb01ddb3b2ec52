#![deny(missing_docs)]

//! Transitional Markov chain Monte Carlo sampler.
//!
//! A run starts from the prior (exponent 0) and walks a sequence of tempered
//! posteriors `prior * likelihood^p` until `p` reaches 1. Each stage fixes
//! the next exponent from the coefficient of variation of the plausibility
//! weights, selects chain leaders multinomially, and grows one Metropolis
//! chain per leader.

/// Exponent search and weighted stage statistics.
pub mod annealing;
/// Proposal kernel and per-leader Markov chains.
pub mod chain;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation for every random stream of a run.
pub mod determinism;
/// Per-stage diagnostics.
pub mod history;
/// Stage loop and the public `run` entry points.
pub mod kernel;
/// Run manifest serialization helpers.
pub mod manifest;
/// Plain-text stage dumps.
pub mod output;
/// Inference problem handed to the sampler.
pub mod problem;
/// Multinomial selection of chain leaders.
pub mod resample;
/// Bounded store holding the current generation.
pub mod store;

pub use annealing::{anneal, AnnealingOutcome};
pub use chain::{advance_chain, ChainContext, ChainOutput, ProposalKernel};
pub use config::{
    AcceptanceRule, ModelConfig, OptimizerConfig, OutputConfig, Parameters, RunConfig,
    SamplerConfig,
};
pub use history::{StageHistory, StageRecord};
pub use kernel::{run, run_from_config, RunSummary};
pub use manifest::{RunManifest, RunProvenance};
pub use problem::Problem;
pub use resample::{multinomial, select_leaders, Leader, Selection};
pub use store::{GenerationEntry, GenerationStore};
