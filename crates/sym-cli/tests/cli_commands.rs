//! Integration tests for the `sym` CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sym() -> Command {
    let mut cmd = Command::cargo_bin("sym").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_prints_dashboard() {
    sym()
        .args(["run", "--agents", "30", "--ticks", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulation"))
        .stdout(predicate::str::contains("Health Dashboard"))
        .stdout(predicate::str::contains("Sugar"))
        .stdout(predicate::str::contains("Oil"));
}

#[test]
fn run_limits_rows() {
    sym()
        .args(["run", "--agents", "30", "--ticks", "1", "--rows", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("showing 5 of"));
}

#[test]
fn run_with_check_audits_every_tick() {
    sym()
        .args(["run", "--agents", "80", "--ticks", "50", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invariants held on every tick"));
}

#[test]
fn run_verbose_shows_event_log() {
    sym()
        .args(["run", "--agents", "10", "--ticks", "2", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Event Log"))
        .stdout(predicate::str::contains("seeded 10 agents"));
}

#[test]
fn run_with_no_agents() {
    sym()
        .args(["run", "--agents", "0", "--ticks", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No agents left alive"));
}

#[test]
fn run_rejects_negative_dt() {
    sym()
        .args(["run", "--ticks", "1", "--dt=-0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("time step"));
}

#[test]
fn run_is_deterministic() {
    let out = |seed: &str| {
        sym()
            .args(["run", "--agents", "40", "--ticks", "30", "--seed", seed])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(out("9"), out("9"));
}

// ---------------------------------------------------------------------------
// snapshot
// ---------------------------------------------------------------------------

#[test]
fn snapshot_to_stdout_is_json() {
    let output = sym()
        .args(["snapshot", "--agents", "12", "--ticks", "5"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["tick"], 5);
    assert!(json["agents"].is_array());
    assert!(json["stats"]["alive"].as_u64().unwrap() <= 12);
}

#[test]
fn snapshot_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    sym()
        .args(["snapshot", "--agents", "8", "--ticks", "3", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("written to"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"dashboard\""));
    assert!(content.contains("\"mean_health\""));
}

#[test]
fn snapshot_unwritable_path_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("snapshot.json");

    sym()
        .args(["snapshot", "--ticks", "1", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot write to"));
}
