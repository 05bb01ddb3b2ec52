use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use env_logger::Env;
use log::info;
use tmcmc_model::ModelRegistry;
use tmcmc_sampler::{run_from_config, RunConfig, RunSummary};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration describing the problem and the sampler.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory for stage dumps, manifest and summary.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Override the master seed of the configuration.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Log per-stage statistics at debug level.
    #[arg(long, short)]
    pub verbose: bool,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let mut config = RunConfig::load(&args.config)?;
    if let Some(out) = &args.out {
        fs::create_dir_all(out)?;
        config.sampler.output.run_directory = Some(out.clone());
    }
    if let Some(seed) = args.seed {
        config.sampler.seed = i64::try_from(seed)
            .map_err(|_| format!("seed {seed} does not fit the configuration seed range"))?;
    }

    let summary = run_from_config(&config, &ModelRegistry::with_builtins())?;

    if let Some(out) = config.sampler.output.run_directory.as_deref() {
        write_json(&out.join("summary.json"), &summary)?;
        let copied = out.join("config.yaml");
        fs::copy(&args.config, &copied).map_err(|err| {
            format!(
                "failed to copy {} to {}: {err}",
                args.config.display(),
                copied.display()
            )
        })?;
        info!("run artefacts written to {}", out.display());
    }
    println!("{}", serde_json::to_string_pretty(&headline(&summary))?);
    Ok(())
}

fn headline(summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "converged": summary.converged,
        "stages": summary.stages_run,
        "final_exponent": summary.final_exponent,
        "log_evidence": summary.log_evidence,
        "posterior_mean": summary.final_weighted_mean(),
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
