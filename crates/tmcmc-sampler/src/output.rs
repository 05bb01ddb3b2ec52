//! Plain-text stage dumps.
//!
//! Each line holds the coordinates of one sample followed by its
//! log-likelihood, separated by single spaces.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::TmcmcError;

use crate::store::GenerationEntry;

/// Path of the dump of `stage` inside `directory`.
pub fn stage_path(directory: &Path, prefix: &str, stage: usize) -> PathBuf {
    directory.join(format!("{prefix}{stage:03}.txt"))
}

/// Renders one dump line, newline excluded.
pub fn format_entry(entry: &GenerationEntry) -> String {
    let mut line = String::new();
    for value in &entry.point {
        let _ = write!(line, "{value:?} ");
    }
    let _ = write!(line, "{:?}", entry.log_fitness);
    line
}

/// Writes `entries` to `path`, creating parent directories as needed.
pub fn write_stage(path: &Path, entries: &[GenerationEntry]) -> Result<(), TmcmcError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| TmcmcError::io("stage-mkdir", &err, parent))?;
    }
    let file = File::create(path).map_err(|err| TmcmcError::io("stage-create", &err, path))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}", format_entry(entry))
            .map_err(|err| TmcmcError::io("stage-write", &err, path))?;
    }
    writer
        .flush()
        .map_err(|err| TmcmcError::io("stage-write", &err, path))
}

/// Reads a stage dump back into entries.
pub fn read_stage(path: &Path) -> Result<Vec<GenerationEntry>, TmcmcError> {
    let contents =
        fs::read_to_string(path).map_err(|err| TmcmcError::io("stage-read", &err, path))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| {
                    TmcmcError::Data(
                        ErrorInfo::new("stage-parse", err.to_string())
                            .with_context("path", path.display().to_string())
                            .with_context("line", (index + 1).to_string()),
                    )
                })?;
            match values.split_last() {
                Some((&log_fitness, point)) if !point.is_empty() => {
                    Ok(GenerationEntry::new(point.to_vec(), log_fitness))
                }
                _ => Err(TmcmcError::Data(
                    ErrorInfo::new("stage-columns", "stage lines need at least two columns")
                        .with_context("path", path.display().to_string())
                        .with_context("line", (index + 1).to_string()),
                )),
            }
        })
        .collect()
}
