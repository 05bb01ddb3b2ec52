use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::TmcmcError;

use crate::config::RunConfig;
use crate::history::StageHistory;

/// Structured manifest describing a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Provenance of the run.
    pub provenance: RunProvenance,
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Whether the final stage reached exponent 1.
    pub converged: bool,
    /// Exponent of the last sampled stage.
    pub final_exponent: f64,
    /// Accumulated log-evidence estimate.
    pub log_evidence: f64,
    /// Stage dumps relative to the run directory, in stage order.
    pub stage_files: Vec<PathBuf>,
    /// Per-stage diagnostics.
    pub history: StageHistory,
}

/// Hex SHA-256 of the JSON rendering of `config`.
pub fn config_hash(config: &RunConfig) -> Result<String, TmcmcError> {
    let bytes = serde_json::to_vec(config).map_err(|err| {
        TmcmcError::Serde(ErrorInfo::new("config-serialize", err.to_string()))
    })?;
    Ok(format!("{:x}", Sha256::digest(bytes)))
}

/// Version of the manifest layout.
pub const MANIFEST_SCHEMA: u32 = 1;

/// Where a run came from: inputs, seed, tool versions and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProvenance {
    /// Manifest layout version.
    pub schema: u32,
    /// SHA-256 of the resolved configuration.
    pub input_hash: String,
    /// Registry name of the forward model.
    pub model: String,
    /// Master seed of every random stream.
    pub seed: u64,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Crate versions that produced the run.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Stamps a run of `model` seeded with `seed`.
    pub fn capture(config: &RunConfig, model: &str, seed: u64) -> Result<Self, TmcmcError> {
        let tool_versions = BTreeMap::from([(
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )]);
        Ok(Self {
            schema: MANIFEST_SCHEMA,
            input_hash: config_hash(config)?,
            model: model.to_string(),
            seed,
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_versions,
        })
    }
}

impl RunManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), TmcmcError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| TmcmcError::io("manifest-mkdir", &err, parent))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            TmcmcError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| TmcmcError::io("manifest-write", &err, path))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, TmcmcError> {
        let contents =
            fs::read_to_string(path).map_err(|err| TmcmcError::io("manifest-read", &err, path))?;
        serde_json::from_str(&contents).map_err(|err| {
            TmcmcError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
