use serde::{Deserialize, Serialize};

/// Diagnostics of one completed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage index, 0 for the prior sample.
    pub stage: usize,
    /// Exponent the stage was sampled at.
    pub exponent: f64,
    /// Number of samples in the generation.
    pub samples: usize,
    /// Number of chains grown during the stage (0 for stage 0).
    pub chains: usize,
    /// Fraction of accepted proposals, absent for stage 0.
    pub acceptance_rate: Option<f64>,
    /// Coefficient of variation of the plausibility weights.
    pub coef_var: f64,
    /// Log-evidence increment to the next exponent.
    pub log_selection: f64,
    /// Exponent chosen for the next stage.
    pub next_exponent: f64,
    /// Whether the exponent search converged.
    pub solver_converged: bool,
    /// Selection count of every member, in store order.
    pub selections: Vec<usize>,
    /// Weighted mean of the generation.
    pub mean: Vec<f64>,
    /// Weighted covariance of the generation.
    pub covariance: Vec<Vec<f64>>,
}

/// Ordered stage records of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageHistory {
    records: Vec<StageRecord>,
}

impl StageHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record of the stage that just finished.
    pub fn push(&mut self, record: StageRecord) {
        self.records.push(record);
    }

    /// All records in stage order.
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Number of recorded stages.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no stage has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&StageRecord> {
        self.records.last()
    }

    /// Exponent sequence `p_0, p_1, ...` of the sampled stages.
    pub fn exponents(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.exponent).collect()
    }

    /// Coefficient of variation of every stage.
    pub fn coef_vars(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.coef_var).collect()
    }

    /// Sum of the log-evidence increments.
    pub fn log_evidence(&self) -> f64 {
        self.records.iter().map(|record| record.log_selection).sum()
    }
}

impl<'a> IntoIterator for &'a StageHistory {
    type Item = &'a StageRecord;
    type IntoIter = std::slice::Iter<'a, StageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
