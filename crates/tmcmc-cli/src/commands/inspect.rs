use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tmcmc_sampler::RunManifest;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Manifest written by `tmcmc run`.
    #[arg(long)]
    pub manifest: PathBuf,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let manifest = RunManifest::load(&args.manifest)?;
    let provenance = &manifest.provenance;
    println!(
        "model {} | seed {} | created {} | input {}",
        provenance.model, provenance.seed, provenance.created_at, provenance.input_hash
    );
    println!(
        "{:>5} {:>14} {:>8} {:>7} {:>10} {:>10} {:>14} {:>14}",
        "stage", "exponent", "samples", "chains", "accept", "cov", "log-select", "next"
    );
    for record in &manifest.history {
        let accept = record
            .acceptance_rate
            .map_or_else(|| "-".to_string(), |rate| format!("{rate:.3}"));
        println!(
            "{:>5} {:>14.6e} {:>8} {:>7} {:>10} {:>10.4} {:>14.6} {:>14.6e}",
            record.stage,
            record.exponent,
            record.samples,
            record.chains,
            accept,
            record.coef_var,
            record.log_selection,
            record.next_exponent
        );
    }
    println!(
        "converged: {} | final exponent: {} | log evidence: {:.6}",
        manifest.converged, manifest.final_exponent, manifest.log_evidence
    );
    Ok(())
}
