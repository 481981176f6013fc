use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Build a minimal valid TOML config for sim mode: a small window keeps the
// run fast in tests.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sampling]
window = 8
rate_hz = 50000

[setpoint]
min_ma = 1000
max_ma = 5000
fine_step_ma = 100
coarse_step_ma = 1000
lockout_ms = 150
initial_ma = 1000

[display]
refresh_divider = 2
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_invalid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sampling]
window = 0
rate_hz = 50000
"#;
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["run", "--max-cycles", "2"], 0, "run complete", "stdout")]
#[case(&["run", "--max-cycles", "2", "--setpoint-ma", "2500"], 0, "run complete", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("eload_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn cli_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let cfg = write_invalid_config(&dir);

    let mut cmd = Command::cargo_bin("eload_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("sampling.window"));
}

#[rstest]
fn json_run_emits_structured_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("eload_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("run")
        .arg("--max-cycles")
        .arg("2");

    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    // Last stdout line is the run summary.
    let last = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap();
    let v: serde_json::Value = serde_json::from_str(last).expect("summary is JSON");
    assert_eq!(v["status"], "complete");
    assert!(v["final"]["voltage_mv"].is_number());
}

#[rstest]
fn missing_config_file_falls_back_to_defaults() {
    // A nonexistent path is not an error; defaults are used. Cap the run so
    // the default 250-sample window still finishes quickly.
    let mut cmd = Command::cargo_bin("eload_cli").unwrap();
    cmd.arg("--config")
        .arg("/nonexistent/eload.toml")
        .arg("run")
        .arg("--max-cycles")
        .arg("1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("run complete"));
}
