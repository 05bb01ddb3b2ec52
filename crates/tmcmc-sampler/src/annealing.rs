//! Given the log-fitness `f` of the current generation and its exponent
//! `p_prev`, the next exponent is the minimiser of
//! `(CoV(q(p)) - tol_cov)^2` with `q_i(p) ∝ exp(f_i (p - p_prev))`.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::TmcmcError;

use crate::config::{OptimizerConfig, Parameters};
use crate::store::{GenerationEntry, GenerationStore};

/// Result of the annealing pass over one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealingOutcome {
    /// Exponent the generation was sampled at.
    pub p_prev: f64,
    /// Exponent of the next generation, clamped to `[0, 1]`.
    pub p_next: f64,
    /// Whether the exponent came from a converged search (false means forced increment).
    pub converged: bool,
    /// Coefficient of variation of the final weights.
    pub coef_var: f64,
    /// Log-evidence increment `ln(mean_k exp(f_k (p_next - p_prev)))`.
    pub log_selection: f64,
    /// Normalized importance weights, one per generation entry.
    pub weights: Vec<f64>,
    /// Weighted mean of the generation.
    pub mean: Vec<f64>,
    /// Weighted covariance of the generation.
    pub covariance: Vec<Vec<f64>>,
}

impl AnnealingOutcome {
    /// Whether the next generation targets the posterior itself.
    pub fn reaches_posterior(&self) -> bool {
        self.p_next >= 1.0
    }
}

/// Raw outcome of the exponent search before bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentSearch {
    /// Chosen exponent, already clamped to 1.
    pub p_next: f64,
    /// Whether the search converged to a point past `p_prev`, or `p_prev` was already 1.
    pub converged: bool,
    /// Objective value at the search minimum (NaN when the search failed).
    pub objective: f64,
}

/// Importance weights `exp(f_k * delta)` normalized to sum to one.
///
/// Returns the weights together with the log of their unnormalized mean,
/// i.e. the log-evidence increment for a step of `delta`. The largest scaled
/// fitness is subtracted before exponentiating.
pub fn normalized_weights(fitness: &[f64], delta: f64) -> (Vec<f64>, f64) {
    let n = fitness.len();
    if n == 0 {
        return (Vec::new(), f64::NAN);
    }
    let scaled: Vec<f64> = fitness
        .iter()
        .map(|&f| if delta == 0.0 { 0.0 } else { f * delta })
        .collect();
    let shift = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !shift.is_finite() {
        return (vec![1.0 / n as f64; n], shift);
    }
    let raw: Vec<f64> = scaled.iter().map(|&s| (s - shift).exp()).collect();
    let total: f64 = raw.iter().sum();
    let weights = raw.iter().map(|&w| w / total).collect();
    (weights, total.ln() + shift - (n as f64).ln())
}

/// Population standard deviation over mean.
pub fn coefficient_of_variation(weights: &[f64]) -> f64 {
    let n = weights.len() as f64;
    let mean = weights.iter().sum::<f64>() / n;
    let variance = weights.iter().map(|&w| (w - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Weighted mean and covariance `SS[i][j] = Σ_k q_k (x_k[i]-m[i]) (x_k[j]-m[j])`.
pub fn weighted_moments(entries: &[GenerationEntry], weights: &[f64]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let dimension = entries.first().map_or(0, |entry| entry.point.len());
    let mut mean = vec![0.0; dimension];
    for (entry, &q) in entries.iter().zip(weights) {
        for (acc, &x) in mean.iter_mut().zip(&entry.point) {
            *acc += q * x;
        }
    }
    let mut covariance = vec![vec![0.0; dimension]; dimension];
    for i in 0..dimension {
        for j in i..dimension {
            let s: f64 = entries
                .iter()
                .zip(weights)
                .map(|(entry, &q)| q * (entry.point[i] - mean[i]) * (entry.point[j] - mean[j]))
                .sum();
            covariance[i][j] = s;
            covariance[j][i] = s;
        }
    }
    (mean, covariance)
}

struct CovMismatch<'a> {
    fitness: &'a [f64],
    p_prev: f64,
    target: f64,
}

impl CostFunction for CovMismatch<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        let candidate = param.first().copied().unwrap_or(self.p_prev);
        let (weights, _) = normalized_weights(self.fitness, candidate - self.p_prev);
        let miss = (coefficient_of_variation(&weights) - self.target).powi(2);
        // The simplex sorts on cost; keep it totally ordered.
        Ok(if miss.is_finite() { miss } else { f64::MAX })
    }
}

/// Searches the next exponent with Nelder-Mead, falling back to `p_prev + 0.1 * step`.
///
/// A generation already at the posterior keeps exponent 1 without a search.
pub fn search_next_exponent(
    fitness: &[f64],
    p_prev: f64,
    tol_cov: f64,
    optimizer: &OptimizerConfig,
) -> ExponentSearch {
    if p_prev >= 1.0 {
        let (weights, _) = normalized_weights(fitness, 0.0);
        return ExponentSearch {
            p_next: 1.0,
            converged: true,
            objective: (coefficient_of_variation(&weights) - tol_cov).powi(2),
        };
    }
    let forced = p_prev + 0.1 * optimizer.step;
    let (minimiser, converged, objective) = match minimise(fitness, p_prev, tol_cov, optimizer) {
        Ok(found) => found,
        Err(err) => {
            warn!("exponent search failed: {err}");
            (None, false, f64::NAN)
        }
    };
    debug!("exponent search: converged = {converged}, xmin = {minimiser:?}, fmin = {objective}");
    let (p_next, converged) = match minimiser {
        Some(x) if converged && x > p_prev => (x, true),
        _ => {
            warn!(
                "exponent search stalled at p = {p_prev}; forcing increment to {forced}"
            );
            (forced, false)
        }
    };
    ExponentSearch {
        p_next: p_next.min(1.0),
        converged,
        objective,
    }
}

fn minimise(
    fitness: &[f64],
    p_prev: f64,
    tol_cov: f64,
    optimizer: &OptimizerConfig,
) -> Result<(Option<f64>, bool, f64), ArgminError> {
    let second = if p_prev != 0.0 { p_prev * 1.05 } else { 0.00025 };
    let solver = NelderMead::new(vec![vec![p_prev], vec![second]]).with_sd_tolerance(optimizer.tol)?;
    let problem = CovMismatch {
        fitness,
        p_prev,
        target: tol_cov,
    };
    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(optimizer.max_iter))
        .run()?;
    let state = result.state();
    let minimiser = state.get_best_param().and_then(|param| param.first().copied());
    let converged = matches!(
        state.get_termination_reason(),
        Some(TerminationReason::SolverConverged)
    );
    Ok((minimiser, converged, state.get_best_cost()))
}

/// Fixes the next exponent for the generation in `store` and computes its statistics.
pub fn anneal(
    store: &GenerationStore,
    p_prev: f64,
    params: &Parameters,
) -> Result<AnnealingOutcome, TmcmcError> {
    if store.is_empty() {
        return Err(TmcmcError::Store(
            ErrorInfo::new("empty-generation", "cannot anneal an empty generation")
                .with_context("exponent", p_prev.to_string()),
        ));
    }
    let fitness = store.log_fitness();
    let search = search_next_exponent(&fitness, p_prev, params.tol_cov, &params.optimizer);
    let (weights, log_selection) = normalized_weights(&fitness, search.p_next - p_prev);
    let coef_var = coefficient_of_variation(&weights);
    let (mean, covariance) = weighted_moments(store.entries(), &weights);
    Ok(AnnealingOutcome {
        p_prev,
        p_next: search.p_next,
        converged: search.converged,
        coef_var,
        log_selection,
        weights,
        mean,
        covariance,
    })
}
