//! Focused CLI argument parsing tests.
//!
//! Tests that verify command-line argument parsing works correctly without
//! needing policy files.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vigil() -> Command {
    Command::cargo_bin("vigil").unwrap()
}

// ============================================================================
// Commands That Need No Input
// ============================================================================

#[test]
fn version_command_succeeds() {
    vigil()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vigil"));
}

#[test]
fn version_flag_shows_version() {
    vigil()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vigil"));
}

#[test]
fn help_flag_shows_usage() {
    vigil()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("attribute-based access"));
}

#[test]
fn help_lists_subcommands() {
    vigil()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("policy"))
        .stdout(predicate::str::contains("config"));
}

// ============================================================================
// Argument Parsing Errors (Missing Required Arguments)
// ============================================================================

#[test]
fn no_command_shows_help() {
    vigil()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_command_fails() {
    vigil()
        .arg("evaluate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn check_requires_request_file() {
    vigil()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn policy_requires_subcommand() {
    vigil()
        .arg("policy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn policy_validate_requires_file() {
    vigil()
        .args(["policy", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn policy_list_rejects_non_numeric_page() {
    vigil()
        .args(["policy", "list", "--page", "first"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn config_show_rejects_unknown_format() {
    vigil()
        .args(["config", "show", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ============================================================================
// Subcommand Help
// ============================================================================

#[test]
fn check_help_shows_options() {
    vigil()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--policies"))
        .stdout(predicate::str::contains("<REQUEST>"));
}

#[test]
fn policy_list_help_shows_options() {
    vigil()
        .args(["policy", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--page"))
        .stdout(predicate::str::contains("--page-size"));
}

#[test]
fn global_flags_are_accepted_after_subcommand() {
    let temp = TempDir::new().unwrap();

    vigil()
        .args(["config", "show", "--no-color", "--project"])
        .arg(temp.path())
        .assert()
        .success();
}

// ============================================================================
// Missing Input Files
// ============================================================================

#[test]
fn check_missing_request_file_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.json");

    vigil()
        .arg("--project")
        .arg(temp.path())
        .arg("check")
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn policy_validate_missing_file_fails() {
    let temp = TempDir::new().unwrap();

    vigil()
        .args(["policy", "validate"])
        .arg(temp.path().join("missing.json"))
        .arg("--project")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
