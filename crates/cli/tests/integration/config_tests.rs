//! Tests for `fnkit config`.

use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn list_shows_defaults_without_a_file() {
  let env = TestEnv::new();
  env
    .cmd()
    .args(["config", "list"])
    .assert()
    .success()
    .stdout(predicate::str::contains("builder"))
    .stdout(predicate::str::contains("pack"))
    .stdout(predicate::str::contains("registryInsecure"));
  assert!(!env.config_file().exists());
}

#[test]
fn set_then_get() {
  let env = TestEnv::new();
  env
    .cmd()
    .args(["config", "set", "registry", "quay.io/alice"])
    .assert()
    .success();
  assert!(env.config_file().exists());

  env
    .cmd()
    .args(["config", "get", "registry"])
    .assert()
    .success()
    .stdout(predicate::str::diff("quay.io/alice\n"));
}

#[test]
fn boolean_settings_accept_common_spellings() {
  let env = TestEnv::new();
  env.cmd().args(["config", "set", "confirm", "T"]).assert().success();
  env
    .cmd()
    .args(["config", "get", "confirm"])
    .assert()
    .success()
    .stdout(predicate::str::diff("true\n"));

  env
    .cmd()
    .args(["config", "set", "confirm", "maybe"])
    .assert()
    .failure();
}

#[test]
fn unknown_key_is_rejected() {
  let env = TestEnv::new();
  env.cmd().args(["config", "get", "colour"]).assert().failure();
  env.cmd().args(["config", "set", "colour", "blue"]).assert().failure();
}

#[test]
fn global_registry_is_used_by_create() {
  let env = TestEnv::new();
  env
    .cmd()
    .args(["config", "set", "registry", "quay.io/alice"])
    .assert()
    .success();
  env
    .cmd()
    .arg("create")
    .arg(env.path("myfn"))
    .args(["-l", "go"])
    .assert()
    .success()
    .stdout(predicate::str::contains("quay.io/alice/myfn:latest"));
}
