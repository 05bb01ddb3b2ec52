use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::{ParameterVector, TmcmcError};

/// One recorded sample of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationEntry {
    /// Parameter vector.
    pub point: ParameterVector,
    /// Log-likelihood of `point`, independent of the annealing exponent.
    pub log_fitness: f64,
}

impl GenerationEntry {
    /// Pairs a point with its log-fitness.
    pub fn new(point: ParameterVector, log_fitness: f64) -> Self {
        Self { point, log_fitness }
    }
}

/// Bounded, append-only collection of the current stage's samples.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStore {
    entries: Vec<GenerationEntry>,
    capacity: usize,
}

impl GenerationStore {
    /// Creates an empty store that accepts at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Drops every entry; the capacity is kept.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Appends an entry, failing once the store is full.
    pub fn append(&mut self, entry: GenerationEntry) -> Result<(), TmcmcError> {
        if self.entries.len() == self.capacity {
            return Err(TmcmcError::Store(
                ErrorInfo::new("capacity-exceeded", "generation store is full")
                    .with_context("capacity", self.capacity.to_string())
                    .with_hint("stage targets and population size disagree"),
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Appends a batch in order, e.g. one chain's buffered output.
    pub fn extend<I>(&mut self, entries: I) -> Result<(), TmcmcError>
    where
        I: IntoIterator<Item = GenerationEntry>,
    {
        entries.into_iter().try_for_each(|entry| self.append(entry))
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry at `index`, if any.
    pub fn entry_at(&self, index: usize) -> Option<&GenerationEntry> {
        self.entries.get(index)
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[GenerationEntry] {
        &self.entries
    }

    /// Log-fitness column in append order.
    pub fn log_fitness(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.log_fitness).collect()
    }
}
