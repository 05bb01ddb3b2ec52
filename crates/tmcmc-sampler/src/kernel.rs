use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::{RngHandle, TmcmcError};
use tmcmc_model::ModelRegistry;

use crate::annealing;
use crate::chain::{self, ChainContext, ChainOutput, ProposalKernel};
use crate::config::{OutputConfig, Parameters, RunConfig};
use crate::determinism;
use crate::history::{StageHistory, StageRecord};
use crate::manifest::{RunManifest, RunProvenance};
use crate::output;
use crate::problem::Problem;
use crate::resample::{self, Leader};
use crate::store::{GenerationEntry, GenerationStore};

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Whether the last sampled stage reached exponent 1.
    pub converged: bool,
    /// Number of sampled stages, stage 0 included.
    pub stages_run: usize,
    /// Exponent of the last sampled stage.
    pub final_exponent: f64,
    /// Accumulated log-evidence estimate.
    pub log_evidence: f64,
    /// Per-stage diagnostics.
    pub history: StageHistory,
    /// Generation of the last sampled stage.
    pub final_samples: Vec<GenerationEntry>,
    /// Stage dumps written during the run.
    pub stage_files: Vec<PathBuf>,
    /// Manifest path, if emitted.
    pub manifest_path: Option<PathBuf>,
}

impl RunSummary {
    /// Weighted mean of the final generation.
    pub fn final_weighted_mean(&self) -> Option<&[f64]> {
        self.history.last().map(|record| record.mean.as_slice())
    }
}

/// Builds the problem described by `config` with `registry` and runs it.
pub fn run_from_config(
    config: &RunConfig,
    registry: &ModelRegistry,
) -> Result<RunSummary, TmcmcError> {
    config.validate()?;
    let problem = Problem::from_config(&config.model, registry)?;
    run(config, &problem)
}

/// Runs the stage loop from the prior to the posterior.
pub fn run(config: &RunConfig, problem: &Problem) -> Result<RunSummary, TmcmcError> {
    config.validate()?;
    let params = Parameters::from_config(config);
    if problem.dimension() != params.dimension {
        return Err(TmcmcError::Config(
            ErrorInfo::new("dimension-mismatch", "problem and configuration dimensions differ")
                .with_context("problem", problem.dimension().to_string())
                .with_context("config", params.dimension.to_string()),
        ));
    }
    let output_dir = config.sampler.output.run_directory.clone();
    let mut store = GenerationStore::with_capacity(params.store_capacity());
    let mut history = StageHistory::new();
    let mut stage_files = Vec::new();

    info!(
        "tmcmc: model = {}, dimension = {}, pop_size = {}, max_stages = {}, seed = {}",
        problem.model_name(),
        params.dimension,
        params.pop_size,
        params.max_stages,
        params.seed
    );

    store.extend(sample_prior_population(problem, &params)?)?;
    dump_stage(&config.sampler.output, 0, &store, &mut stage_files)?;

    let mut stage = 0;
    let mut exponent = 0.0;
    let mut chains = 0;
    let mut acceptance_rate = None;
    let converged = loop {
        let outcome = annealing::anneal(&store, exponent, &params)?;
        let target = if outcome.reaches_posterior() {
            params.pop_size
        } else {
            params.stage_target(stage + 1)
        };
        let mut selection_rng =
            RngHandle::from_seed(determinism::resample_seed(params.seed, stage));
        let selection =
            resample::select_leaders(&store, &outcome.weights, target, &mut selection_rng)?;

        info!(
            "stage {stage}: p = {exponent:.6e}, samples = {}, chains = {chains}, cov = {:.4}, next p = {:.6e}",
            store.len(),
            outcome.coef_var,
            outcome.p_next
        );
        debug!("stage {stage}: selection counts = {:?}", selection.counts);
        debug!("stage {stage}: mean = {:?}", outcome.mean);
        debug!("stage {stage}: covariance = {:?}", outcome.covariance);

        let leaders = selection.leaders;
        history.push(StageRecord {
            stage,
            exponent,
            samples: store.len(),
            chains,
            acceptance_rate,
            coef_var: outcome.coef_var,
            log_selection: outcome.log_selection,
            next_exponent: outcome.p_next,
            solver_converged: outcome.converged,
            selections: selection.counts,
            mean: outcome.mean.clone(),
            covariance: outcome.covariance.clone(),
        });

        if exponent >= 1.0 {
            break true;
        }
        if stage + 1 >= params.max_stages {
            warn!(
                "stage budget of {} exhausted at p = {exponent}; posterior not reached",
                params.max_stages
            );
            break false;
        }

        let proposal = ProposalKernel::new(&outcome.covariance, params.bbeta)?;
        stage += 1;
        exponent = outcome.p_next;
        let ctx = ChainContext {
            priors: problem.priors(),
            likelihood: problem.likelihood(),
            proposal: &proposal,
            exponent,
            burn_in: params.burn_in,
            acceptance: params.acceptance,
            max_proposal_retries: params.max_proposal_retries,
        };
        let outputs = advance_chains(&ctx, &leaders, params.seed, stage)?;

        store.reset();
        let mut accepted = 0;
        let mut proposed = 0;
        for chain_output in outputs {
            accepted += chain_output.accepted;
            proposed += chain_output.proposed;
            store.extend(chain_output.entries)?;
        }
        chains = leaders.len();
        acceptance_rate = Some(if proposed == 0 {
            0.0
        } else {
            accepted as f64 / proposed as f64
        });
        dump_stage(&config.sampler.output, stage, &store, &mut stage_files)?;
    };

    info!("exponents: {:?}", history.exponents());
    info!("coefficients of variation: {:?}", history.coef_vars());
    let log_evidence = history.log_evidence();
    info!("log evidence: {log_evidence}");

    let manifest_path = match output_dir {
        Some(run_dir) => {
            let path = run_dir.join(&config.sampler.output.manifest_file);
            let manifest = RunManifest {
                provenance: RunProvenance::capture(config, problem.model_name(), params.seed)?,
                config: config.clone(),
                converged,
                final_exponent: exponent,
                log_evidence,
                stage_files: relative_to(&run_dir, &stage_files),
                history: history.clone(),
            };
            manifest.write(&path)?;
            Some(path)
        }
        None => None,
    };

    Ok(RunSummary {
        converged,
        stages_run: history.len(),
        final_exponent: exponent,
        log_evidence,
        history,
        final_samples: store.entries().to_vec(),
        stage_files,
        manifest_path,
    })
}

fn evaluate_prior_draw(
    problem: &Problem,
    seed: u64,
    index: usize,
) -> Result<GenerationEntry, TmcmcError> {
    let mut rng = RngHandle::from_seed(determinism::population_seed(seed, index));
    let point = problem.priors().sample_point(&mut rng);
    let log_fitness = problem.likelihood().evaluate(&point);
    if log_fitness.is_nan() {
        return Err(TmcmcError::Sampling(
            ErrorInfo::new("nan-fitness", "log-likelihood evaluated to NaN")
                .with_context("point", format!("{point:?}")),
        ));
    }
    Ok(GenerationEntry::new(point, log_fitness))
}

#[cfg(feature = "parallel")]
fn sample_prior_population(
    problem: &Problem,
    params: &Parameters,
) -> Result<Vec<GenerationEntry>, TmcmcError> {
    use rayon::prelude::*;
    (0..params.stage_target(0))
        .into_par_iter()
        .map(|index| evaluate_prior_draw(problem, params.seed, index))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn sample_prior_population(
    problem: &Problem,
    params: &Parameters,
) -> Result<Vec<GenerationEntry>, TmcmcError> {
    (0..params.stage_target(0))
        .map(|index| evaluate_prior_draw(problem, params.seed, index))
        .collect()
}

fn run_chain(
    ctx: &ChainContext<'_>,
    leader: &Leader,
    seed: u64,
    stage: usize,
    index: usize,
) -> Result<ChainOutput, TmcmcError> {
    let mut rng = RngHandle::from_seed(determinism::chain_seed(seed, stage, index));
    chain::advance_chain(ctx, leader, &mut rng)
}

#[cfg(feature = "parallel")]
fn advance_chains(
    ctx: &ChainContext<'_>,
    leaders: &[Leader],
    seed: u64,
    stage: usize,
) -> Result<Vec<ChainOutput>, TmcmcError> {
    use rayon::prelude::*;
    leaders
        .par_iter()
        .enumerate()
        .map(|(index, leader)| run_chain(ctx, leader, seed, stage, index))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn advance_chains(
    ctx: &ChainContext<'_>,
    leaders: &[Leader],
    seed: u64,
    stage: usize,
) -> Result<Vec<ChainOutput>, TmcmcError> {
    leaders
        .iter()
        .enumerate()
        .map(|(index, leader)| run_chain(ctx, leader, seed, stage, index))
        .collect()
}

fn dump_stage(
    layout: &OutputConfig,
    stage: usize,
    store: &GenerationStore,
    written: &mut Vec<PathBuf>,
) -> Result<(), TmcmcError> {
    if let Some(run_dir) = &layout.run_directory {
        let path = output::stage_path(run_dir, &layout.stage_prefix, stage);
        output::write_stage(&path, store.entries())?;
        written.push(path);
    }
    Ok(())
}

fn relative_to(run_dir: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| path.strip_prefix(run_dir).ok().map(Path::to_path_buf))
        .collect()
}
