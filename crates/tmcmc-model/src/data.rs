use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::TmcmcError;

/// Observed `(x_t, y_t)` pairs the model is fitted against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedData {
    points: Vec<(f64, f64)>,
}

impl ObservedData {
    /// Builds a table from in-memory pairs.
    pub fn from_pairs(points: Vec<(f64, f64)>) -> Result<Self, TmcmcError> {
        if points.is_empty() {
            return Err(TmcmcError::Data(ErrorInfo::new(
                "data-empty",
                "observed data table contains no rows",
            )));
        }
        Ok(Self { points })
    }

    /// Reads a whitespace separated table from disk.
    pub fn load(path: &Path) -> Result<Self, TmcmcError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            TmcmcError::Data(
                ErrorInfo::new("data-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let data = Self::parse(&contents).map_err(|err| match err {
            TmcmcError::Data(info) => {
                TmcmcError::Data(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })?;
        debug!("loaded {} observations from {}", data.len(), path.display());
        Ok(data)
    }

    /// Parses a table of at least two numeric columns per row.
    ///
    /// Blank lines and lines starting with `#` are skipped; columns beyond the
    /// second are ignored.
    pub fn parse(contents: &str) -> Result<Self, TmcmcError> {
        let mut points = Vec::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let columns = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| {
                    TmcmcError::Data(
                        ErrorInfo::new("data-parse", err.to_string())
                            .with_context("line", (idx + 1).to_string()),
                    )
                })?;
            if columns.len() < 2 {
                return Err(TmcmcError::Data(
                    ErrorInfo::new("data-columns", "expected two numeric columns")
                        .with_context("line", (idx + 1).to_string())
                        .with_context("found", columns.len().to_string()),
                ));
            }
            points.push((columns[0], columns[1]));
        }
        Self::from_pairs(points)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over `(x_t, y_t)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }
}
