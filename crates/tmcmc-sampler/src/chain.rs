//! Random-walk Metropolis chains grown from the selected leaders.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::StandardNormal;
use log::warn;
use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::{LogLikelihood, ParameterVector, RngHandle, TmcmcError};
use tmcmc_model::PriorSet;

use crate::config::AcceptanceRule;
use crate::resample::Leader;
use crate::store::GenerationEntry;

const EIGEN_MAX_ITERATIONS: usize = 10_000;
const REDRAW_WARN_THRESHOLD: usize = 1_000;

impl AcceptanceRule {
    /// Decides a proposal with log ratio `log_ratio` given a uniform draw `u`.
    ///
    /// A NaN ratio is always rejected.
    pub fn accepts(self, log_ratio: f64, u: f64) -> bool {
        if log_ratio.is_nan() {
            return false;
        }
        match self {
            AcceptanceRule::Metropolis => u < log_ratio.min(0.0).exp(),
            AcceptanceRule::ClampedLog => u < log_ratio.min(1.0),
        }
    }
}

/// Gaussian proposal `N(x, bbeta * SS)` factored once per stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalKernel {
    factor: DMatrix<f64>,
}

impl ProposalKernel {
    /// Factors `bbeta * covariance` as `V diag(sqrt(max(λ, 0)))`.
    pub fn new(covariance: &[Vec<f64>], bbeta: f64) -> Result<Self, TmcmcError> {
        let dimension = covariance.len();
        if covariance.iter().any(|row| row.len() != dimension) {
            return Err(TmcmcError::Sampling(
                ErrorInfo::new("covariance-shape", "proposal covariance must be square")
                    .with_context("rows", dimension.to_string()),
            ));
        }
        let scaled = DMatrix::from_fn(dimension, dimension, |i, j| {
            0.5 * bbeta * (covariance[i][j] + covariance[j][i])
        });
        if scaled.iter().any(|value| !value.is_finite()) {
            return Err(TmcmcError::Sampling(ErrorInfo::new(
                "non-finite-covariance",
                "proposal covariance contains non-finite entries",
            )));
        }
        let eigen = SymmetricEigen::try_new(scaled, f64::EPSILON, EIGEN_MAX_ITERATIONS)
            .ok_or_else(|| {
                TmcmcError::Sampling(ErrorInfo::new(
                    "covariance-factorization",
                    "eigen decomposition of the proposal covariance did not converge",
                ))
            })?;
        let roots = eigen.eigenvalues.map(|lambda| lambda.max(0.0).sqrt());
        let factor = &eigen.eigenvectors * DMatrix::from_diagonal(&roots);
        Ok(Self { factor })
    }

    /// Dimension of the proposal.
    pub fn dimension(&self) -> usize {
        self.factor.nrows()
    }

    /// Draws `center + L z` with `z` standard normal.
    pub fn propose(&self, center: &[f64], rng: &mut RngHandle) -> ParameterVector {
        let dimension = self.dimension();
        let z = DVector::from_iterator(
            dimension,
            (0..dimension).map(|_| rng.sample::<f64, _>(StandardNormal)),
        );
        let step = &self.factor * z;
        center.iter().zip(step.iter()).map(|(c, s)| c + s).collect()
    }
}

/// Everything a chain needs besides its leader and random stream.
#[derive(Clone, Copy)]
pub struct ChainContext<'a> {
    /// Joint prior.
    pub priors: &'a PriorSet,
    /// Log-likelihood of the problem.
    pub likelihood: &'a dyn LogLikelihood,
    /// Factored proposal of the stage.
    pub proposal: &'a ProposalKernel,
    /// Annealing exponent of the stage.
    pub exponent: f64,
    /// Steps discarded before recording.
    pub burn_in: usize,
    /// Acceptance rule.
    pub acceptance: AcceptanceRule,
    /// Redraw budget for out-of-support proposals.
    pub max_proposal_retries: usize,
}

/// Samples recorded by one chain plus its acceptance counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainOutput {
    /// Recorded samples, in chain order.
    pub entries: Vec<GenerationEntry>,
    /// Accepted proposals.
    pub accepted: usize,
    /// Proposals evaluated.
    pub proposed: usize,
}

fn draw_candidate(
    ctx: &ChainContext<'_>,
    current: &[f64],
    rng: &mut RngHandle,
) -> Result<ParameterVector, TmcmcError> {
    for attempt in 0..ctx.max_proposal_retries {
        if attempt == REDRAW_WARN_THRESHOLD {
            warn!("{attempt} proposals from {current:?} fell outside the prior support");
        }
        let candidate = ctx.proposal.propose(current, rng);
        if candidate.iter().any(|value| value.is_nan()) {
            return Err(TmcmcError::Sampling(
                ErrorInfo::new("nan-candidate", "proposal produced a NaN coordinate")
                    .with_context("center", format!("{current:?}")),
            ));
        }
        if ctx.priors.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(TmcmcError::Sampling(
        ErrorInfo::new(
            "proposal-support-exhausted",
            "no proposal landed inside the prior support",
        )
        .with_context("retries", ctx.max_proposal_retries.to_string())
        .with_context("center", format!("{current:?}"))
        .with_hint("lower bbeta or widen the prior bounds"),
    ))
}

/// Runs `burn_in + replication_count` steps from `leader`, recording the tail.
pub fn advance_chain(
    ctx: &ChainContext<'_>,
    leader: &Leader,
    rng: &mut RngHandle,
) -> Result<ChainOutput, TmcmcError> {
    if leader.point.len() != ctx.proposal.dimension() {
        return Err(TmcmcError::Sampling(
            ErrorInfo::new("dimension-mismatch", "leader and proposal dimensions differ")
                .with_context("leader", leader.point.len().to_string())
                .with_context("proposal", ctx.proposal.dimension().to_string()),
        ));
    }
    let mut current = leader.point.clone();
    let mut current_fitness = leader.log_fitness;
    let mut current_prior = ctx.priors.log_density(&current);
    let mut output = ChainOutput {
        entries: Vec::with_capacity(leader.replication_count),
        ..ChainOutput::default()
    };

    for step in 0..ctx.burn_in + leader.replication_count {
        let candidate = draw_candidate(ctx, &current, rng)?;
        let candidate_fitness = ctx.likelihood.evaluate(&candidate);
        if candidate_fitness.is_nan() {
            return Err(TmcmcError::Sampling(
                ErrorInfo::new("nan-fitness", "log-likelihood evaluated to NaN")
                    .with_context("point", format!("{candidate:?}")),
            ));
        }
        let candidate_prior = ctx.priors.log_density(&candidate);
        let fitness_term = if ctx.exponent == 0.0 {
            0.0
        } else {
            ctx.exponent * (candidate_fitness - current_fitness)
        };
        let log_ratio = (candidate_prior - current_prior) + fitness_term;
        output.proposed += 1;
        if ctx.acceptance.accepts(log_ratio, rng.next_unit()) {
            current = candidate;
            current_fitness = candidate_fitness;
            current_prior = candidate_prior;
            output.accepted += 1;
        }
        if step >= ctx.burn_in {
            output
                .entries
                .push(GenerationEntry::new(current.clone(), current_fitness));
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metropolis_accepts_uphill_moves() {
        assert!(AcceptanceRule::Metropolis.accepts(0.3, 0.999));
        assert!(!AcceptanceRule::Metropolis.accepts(f64::NAN, 0.0));
        assert!(!AcceptanceRule::Metropolis.accepts(-50.0, 0.01));
    }

    #[test]
    fn clamped_log_rejects_negative_ratios() {
        assert!(!AcceptanceRule::ClampedLog.accepts(-0.1, 0.0));
        assert!(AcceptanceRule::ClampedLog.accepts(0.5, 0.4));
    }

    #[test]
    fn degenerate_covariance_gives_zero_steps() {
        let kernel = ProposalKernel::new(&[vec![0.0, 0.0], vec![0.0, 0.0]], 0.2).unwrap();
        let mut rng = RngHandle::from_seed(3);
        assert_eq!(kernel.propose(&[1.0, -1.0], &mut rng), vec![1.0, -1.0]);
    }
}
