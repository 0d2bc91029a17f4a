//! CLI Integration Tests
//!
//! Tests for `velesdb-stats` commands using `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the CLI binary command
#[allow(deprecated)]
fn stats_cmd() -> Command {
    let mut cmd = Command::cargo_bin("velesdb-stats").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Writes `0..rows` (mod `domain`) one per line and builds statistics.
fn build_part(dir: &Path, rows: usize, domain: usize, kinds: &str) -> PathBuf {
    let input = dir.join("values.txt");
    let body: String = (0..rows).map(|i| format!("{}\n", i % domain)).collect();
    fs::write(&input, body).unwrap();
    let part = dir.join("part");

    stats_cmd()
        .current_dir(dir)
        .args(["build", "--column", "n", "--type", "Int64", "--kinds", kinds])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&part)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    part.join("statistics_n.stats")
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    stats_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VelesDB Stats CLI"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_command_shows_error() {
    stats_cmd()
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// =============================================================================
// Build / Inspect
// =============================================================================

#[test]
fn test_build_then_inspect_json() {
    let temp_dir = TempDir::new().unwrap();
    let file = build_part(temp_dir.path(), 1_000, 100, "tdigest,uniq");
    assert!(file.exists());

    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("inspect")
        .arg(&file)
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows\": 1000"))
        .stdout(predicate::str::contains("\"tdigest\""))
        .stdout(predicate::str::contains("\"uniq\""))
        .stdout(predicate::str::contains("\"version\": 0"));
}

#[test]
fn test_inspect_table_output() {
    let temp_dir = TempDir::new().unwrap();
    let file = build_part(temp_dir.path(), 10, 10, "uniq");

    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows"))
        .stdout(predicate::str::contains("uniq"));
}

#[test]
fn test_build_rejects_tdigest_on_string() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("words.txt");
    fs::write(&input, "a\nb\n").unwrap();

    stats_cmd()
        .current_dir(temp_dir.path())
        .args(["build", "--column", "w", "--type", "String", "--kinds", "tdigest"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(temp_dir.path().join("part"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("STATS-002"));
}

#[test]
fn test_build_rejects_unknown_kind() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("values.txt");
    fs::write(&input, "1\n").unwrap();

    stats_cmd()
        .current_dir(temp_dir.path())
        .args(["build", "--column", "n", "--type", "Int64", "--kinds", "bloom"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(temp_dir.path().join("part"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("STATS-001"));
}

#[test]
fn test_inspect_unknown_version_fails() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("statistics_x.stats");
    let mut bytes = vec![9u8, 0];
    bytes.extend_from_slice(&[0u8; 16]);
    fs::write(&file, bytes).unwrap();

    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("inspect")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("STATS-006"));
}

// =============================================================================
// Estimate
// =============================================================================

#[test]
fn test_estimate_less_uses_histogram() {
    let temp_dir = TempDir::new().unwrap();
    let file = build_part(temp_dir.path(), 1_000, 100, "tdigest,uniq");

    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("estimate")
        .arg(&file)
        .args(["--column", "n", "--type", "Int64", "--kinds", "tdigest,uniq"])
        .args(["--op", "less", "--value", "50"])
        .assert()
        .success()
        .stdout(predicate::str::diff("500\n"));
}

#[test]
fn test_estimate_less_below_minimum_prints_zero() {
    let temp_dir = TempDir::new().unwrap();
    let file = build_part(temp_dir.path(), 1_000, 100, "tdigest");

    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("estimate")
        .arg(&file)
        .args(["--column", "n", "--type", "Int64", "--kinds", "tdigest"])
        .args(["--op", "less", "--value", "-5"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}

#[test]
fn test_estimate_equal_after_schema_shrink() {
    let temp_dir = TempDir::new().unwrap();
    let file = build_part(temp_dir.path(), 1_000, 100, "tdigest,uniq");

    // uniq no longer declared: equality falls back to rows * 0.1 for a small literal
    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("estimate")
        .arg(&file)
        .args(["--column", "n", "--type", "Int64", "--kinds", "tdigest"])
        .args(["--op", "equal", "--value", "-1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("100\n"));
}

#[test]
fn test_config_overrides_factors() {
    let temp_dir = TempDir::new().unwrap();
    let file = build_part(temp_dir.path(), 1_000, 100, "uniq");
    let config = temp_dir.path().join("custom.toml");
    fs::write(&config, "[estimation]\nnormal_selectivity = 0.25\n").unwrap();

    stats_cmd()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("estimate")
        .arg(&file)
        .args(["--column", "n", "--type", "Int64", "--kinds", "uniq"])
        .args(["--op", "greater", "--value", "10"])
        .assert()
        .success()
        .stdout(predicate::str::diff("750\n"));
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    stats_cmd()
        .current_dir(temp_dir.path())
        .args(["--config", "missing.toml", "inspect", "x.stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}
