use log::debug;
use rand::distributions::Distribution;
use rand_distr::Binomial;
use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::{ParameterVector, RngHandle, TmcmcError};

use crate::store::GenerationStore;

/// A selected generation member and the number of samples its chain must record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    /// Starting point of the chain.
    pub point: ParameterVector,
    /// Log-likelihood at `point`.
    pub log_fitness: f64,
    /// Number of post burn-in samples the chain records.
    pub replication_count: usize,
}

/// Selection counts together with the promoted leaders.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Count per store entry, summing to the target.
    pub counts: Vec<usize>,
    /// Entries with a positive count, in store order.
    pub leaders: Vec<Leader>,
}

fn sampling_error(code: &str, message: impl Into<String>) -> TmcmcError {
    TmcmcError::Sampling(ErrorInfo::new(code, message))
}

/// Draws `trials` outcomes over categories with probabilities `weights`.
///
/// Implemented as a sequence of conditional binomial draws; the last category
/// with positive weight absorbs the remainder.
pub fn multinomial(
    trials: usize,
    weights: &[f64],
    rng: &mut RngHandle,
) -> Result<Vec<usize>, TmcmcError> {
    let mut counts = vec![0usize; weights.len()];
    if trials == 0 {
        return Ok(counts);
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(sampling_error(
            "invalid-weights",
            "selection weights must be finite and non-negative",
        ));
    }
    let last = weights.iter().rposition(|&w| w > 0.0).ok_or_else(|| {
        sampling_error("degenerate-weights", "all selection weights are zero")
    })?;

    let mut remaining = trials as u64;
    let mut mass: f64 = weights[..=last].iter().sum();
    for (index, &weight) in weights[..=last].iter().enumerate() {
        if remaining == 0 {
            break;
        }
        if index == last {
            counts[index] = remaining as usize;
            break;
        }
        let p = if mass > 0.0 { (weight / mass).clamp(0.0, 1.0) } else { 0.0 };
        let binomial = Binomial::new(remaining, p).map_err(|err| {
            TmcmcError::Sampling(
                ErrorInfo::new("invalid-weights", err.to_string())
                    .with_context("category", index.to_string()),
            )
        })?;
        let drawn = binomial.sample(rng);
        counts[index] = drawn as usize;
        remaining -= drawn;
        mass -= weight;
    }
    Ok(counts)
}

/// Turns selection counts into leaders, skipping unselected entries.
pub fn promote(store: &GenerationStore, counts: &[usize]) -> Vec<Leader> {
    store
        .entries()
        .iter()
        .zip(counts)
        .filter(|(_, &count)| count > 0)
        .map(|(entry, &count)| Leader {
            point: entry.point.clone(),
            log_fitness: entry.log_fitness,
            replication_count: count,
        })
        .collect()
}

/// Selects `target` members of `store` by their weights and promotes them.
pub fn select_leaders(
    store: &GenerationStore,
    weights: &[f64],
    target: usize,
    rng: &mut RngHandle,
) -> Result<Selection, TmcmcError> {
    let counts = multinomial(target, weights, rng)?;
    let leaders = promote(store, &counts);
    debug!(
        "selected {} leaders for {} samples out of {} entries",
        leaders.len(),
        target,
        store.len()
    );
    Ok(Selection { counts, leaders })
}
