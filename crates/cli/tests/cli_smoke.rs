//! CLI smoke tests for fnkit.
//!
//! These tests verify that the commands parse, run without panicking and
//! return appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// A fnkit command whose global config lives in `home`.
fn fnkit_cmd(home: &TempDir) -> Command {
  let mut cmd = cargo_bin_cmd!("fnkit");
  cmd
    .env("XDG_CONFIG_HOME", home.path())
    .env("FNKIT_CONFIG_FILE", home.path().join("config.yaml"))
    .env("FNKIT_REPOSITORIES_PATH", home.path().join("repositories"));
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  let home = TempDir::new().unwrap();
  fnkit_cmd(&home)
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("create"));
}

#[test]
fn version_flag_works() {
  let home = TempDir::new().unwrap();
  fnkit_cmd(&home)
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("fnkit"));
}

#[test]
fn unknown_command_fails() {
  let home = TempDir::new().unwrap();
  fnkit_cmd(&home).arg("deploy-everything").assert().failure();
}

#[test]
fn subcommand_help_works() {
  let home = TempDir::new().unwrap();
  for sub in ["create", "templates", "repository", "migrate", "info", "stamp", "envs", "config"] {
    fnkit_cmd(&home).args([sub, "--help"]).assert().success();
  }
}

// =============================================================================
// Uninitialized directories
// =============================================================================

#[test]
fn info_on_empty_directory_fails() {
  let home = TempDir::new().unwrap();
  let dir = TempDir::new().unwrap();
  fnkit_cmd(&home)
    .arg("info")
    .arg(dir.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("does not contain an initialized function"));
}

#[test]
fn stamp_on_empty_directory_fails() {
  let home = TempDir::new().unwrap();
  let dir = TempDir::new().unwrap();
  fnkit_cmd(&home).arg("stamp").arg(dir.path()).assert().failure();
}

#[test]
fn create_without_language_fails() {
  let home = TempDir::new().unwrap();
  let dir = TempDir::new().unwrap();
  fnkit_cmd(&home)
    .arg("create")
    .arg(dir.path().join("myfn"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("language"));
}
