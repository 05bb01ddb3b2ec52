use std::error::Error;
use std::process::Command;

use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Emit extended metadata including git and toolchain information.
    #[arg(long)]
    pub long: bool,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: String,
    git_commit: String,
    rustc: String,
    features: Vec<String>,
}

pub fn run(args: &VersionArgs) -> Result<(), Box<dyn Error>> {
    if !args.long {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&gather_info())?);
    Ok(())
}

fn command_line(program: &str, args: &[&str]) -> Option<String> {
    let out = Command::new(program).args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn gather_info() -> VersionInfo {
    let mut features = Vec::new();
    if cfg!(feature = "parallel") {
        features.push("parallel".into());
    }
    if features.is_empty() {
        features.push("default".into());
    }
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").into(),
        git_commit: command_line("git", &["rev-parse", "HEAD"]).unwrap_or_else(|| "unknown".into()),
        rustc: command_line("rustc", &["--version"])
            .unwrap_or_else(|| "rustc unavailable".into()),
        features,
    }
}
