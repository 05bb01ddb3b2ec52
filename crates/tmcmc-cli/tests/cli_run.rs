use std::fs;
use std::process::Command;

use tempfile::tempdir;

const DATA: &str = "1 2\n2 4\n3 6\n4 8\n";

const CONFIG: &str = r#"
model:
  dimension: 1
  model: linear
  data_file: data.txt
  priors: ["uniform 0 5"]
  error_prior: "normal 0 0.5"
sampler:
  pop_size: 100
  max_stages: 20
"#;

#[test]
fn run_then_inspect() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), DATA).unwrap();
    let config = dir.path().join("run.yaml");
    fs::write(&config, CONFIG).unwrap();
    let out = dir.path().join("out");

    let status = Command::new(env!("CARGO_BIN_EXE_tmcmc"))
        .args(["run", "--seed", "5", "--config"])
        .arg(&config)
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(status.status.success(), "{}", String::from_utf8_lossy(&status.stderr));
    let headline: serde_json::Value = serde_json::from_slice(&status.stdout).unwrap();
    assert_eq!(headline["converged"], serde_json::Value::Bool(true));

    assert!(out.join("summary.json").exists());
    assert!(out.join("curgen_db_000.txt").exists());
    let manifest = out.join("manifest.json");
    assert!(manifest.exists());

    let inspect = Command::new(env!("CARGO_BIN_EXE_tmcmc"))
        .args(["inspect", "--manifest"])
        .arg(&manifest)
        .output()
        .unwrap();
    assert!(inspect.status.success());
    let table = String::from_utf8_lossy(&inspect.stdout);
    assert!(table.contains("model linear | seed 5"));
    assert!(table.contains("converged: true"));
}

#[test]
fn unwritable_config_copy_fails_the_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), DATA).unwrap();
    let config = dir.path().join("run.yaml");
    fs::write(&config, CONFIG).unwrap();
    let out = dir.path().join("out");
    // A directory in place of the copied config makes the copy fail.
    fs::create_dir_all(out.join("config.yaml")).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tmcmc"))
        .args(["run", "--config"])
        .arg(&config)
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config.yaml"));
}

#[test]
fn missing_config_fails() {
    let dir = tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_tmcmc"))
        .args(["run", "--config"])
        .arg(dir.path().join("nope.yaml"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_tmcmc"))
        .arg("version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );
}
