use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    inspect::{self, InspectArgs},
    run::{self, RunArgs},
    version::{self, VersionArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tmcmc", about = "Transitional MCMC posterior sampler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the posterior described by a YAML configuration.
    Run(RunArgs),
    /// Print the stage table of a finished run.
    Inspect(InspectArgs),
    /// Print version information.
    Version(VersionArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Inspect(args) => inspect::run(&args),
        Command::Version(args) => version::run(&args),
    }
}
