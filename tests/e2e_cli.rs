//! CLI end-to-end tests
//!
//! Tests for the clipforge command-line interface. None of these need a
//! media engine installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the clipforge binary
#[allow(deprecated)]
fn clipforge_cmd() -> Command {
    Command::cargo_bin("clipforge").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    clipforge_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    clipforge_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "clipforge {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_cli_operations_lists_catalog() {
    clipforge_cmd()
        .arg("operations")
        .assert()
        .success()
        .stdout(predicate::str::contains("trimVideo"))
        .stdout(predicate::str::contains("cropToAspectRatio"))
        .stdout(predicate::str::contains("normalizeAudio"));
}

#[test]
fn test_cli_operations_shows_single_entry() {
    clipforge_cmd()
        .args(["operations", "trimVideo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trimVideo"))
        .stdout(predicate::str::contains("normalizeAudio").not());
}

#[test]
fn test_cli_operations_rejects_unknown_name() {
    clipforge_cmd()
        .args(["operations", "explodeVideo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported operation"));
}

#[test]
fn test_cli_styles_lists_presets() {
    clipforge_cmd()
        .arg("styles")
        .assert()
        .success()
        .stdout(predicate::str::contains("cinematic"))
        .stdout(predicate::str::contains("dreamy"));
}

#[test]
fn test_cli_serve_help() {
    clipforge_cmd()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Start the processing service"));
}

#[test]
fn test_cli_serve_invalid_port() {
    clipforge_cmd()
        .args(["serve", "--port", "99999"])
        .assert()
        .failure();
}

#[test]
fn test_cli_run_requires_op() {
    clipforge_cmd()
        .args(["run", "--source", "http://127.0.0.1:9/in.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--op"));
}

#[test]
fn test_cli_run_rejects_malformed_op() {
    clipforge_cmd()
        .args(["run", "--source", "http://127.0.0.1:9/in.mp4", "--op", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid operation object"));
}

#[test]
fn test_cli_style_unknown_reports_unsupported() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("clipforge.toml");
    fs::write(
        &config_file,
        format!(
            "[workspace]\nscratch_dir = \"{}\"\n",
            temp.path().join("scratch").display()
        ),
    )
    .unwrap();

    clipforge_cmd()
        .args(["--config", config_file.to_str().unwrap()])
        .args(["style", "--source", "http://127.0.0.1:9/in.mp4", "glitchcore"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error_kind\": \"UnsupportedOperation\""));
}

#[test]
fn test_cli_validate_valid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("clipforge.toml");
    fs::write(
        &config_file,
        r#"
[server]
host = "127.0.0.1"
port = 3001

[remote]
enabled = false
"#,
    )
    .unwrap();

    clipforge_cmd()
        .args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("clipforge.toml");
    fs::write(&config_file, "this is not [valid toml").unwrap();

    clipforge_cmd()
        .args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_cli_validate_missing_file() {
    clipforge_cmd()
        .args(["validate", "/nonexistent/clipforge.toml"])
        .assert()
        .failure();
}
