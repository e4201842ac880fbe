//! Tests for `fnkit migrate`.

use predicates::prelude::*;

use crate::common::TestEnv;

const LEGACY: &str = "version: 0.18.0
name: legacy
runtime: go
namespace: prod
envs:
- name: GREETING
  value: hello
invocation:
  format: cloudevent
";

#[test]
fn migrate_upgrades_legacy_layout() {
  let env = TestEnv::new();
  env.write_file("legacy/func.yaml", LEGACY);

  env
    .cmd()
    .arg("migrate")
    .arg(env.path("legacy"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Migrated from 0 to 0.35.0"));

  let yaml = env.read_file("legacy/func.yaml");
  assert!(yaml.contains("specVersion: 0.35.0"));
  assert!(yaml.contains("created:"));
  assert!(yaml.contains("namespace: prod"));
  assert!(yaml.contains("invoke: cloudevent"));
  assert!(yaml.contains("GREETING"));
  assert!(!yaml.contains("invocation"));
  assert!(!yaml.contains("version: 0.18.0"));
}

#[test]
fn migrate_of_current_function_is_a_no_op() {
  let env = TestEnv::new();
  let path = env.create("myfn", "go");
  let before = env.read_file("myfn/func.yaml");

  env
    .cmd()
    .arg("migrate")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Already at spec version"));
  assert_eq!(env.read_file("myfn/func.yaml"), before);
}

#[test]
fn migrate_rejects_unparsable_version() {
  let env = TestEnv::new();
  env.write_file(
    "broken/func.yaml",
    "specVersion: not-a-version\nname: broken\nruntime: go\ncreated: 2024-01-01T00:00:00Z\n",
  );
  env.cmd().arg("migrate").arg(env.path("broken")).assert().failure();
}

#[test]
fn migrate_leaves_newer_spec_version_untouched() {
  let env = TestEnv::new();
  let newer = "specVersion: 9.0.0\nname: future\nruntime: go\nregistry: ''\nimage: ''\ncreated: 2024-01-01T00:00:00Z\n";
  env.write_file("future/func.yaml", newer);

  env
    .cmd()
    .arg("migrate")
    .arg(env.path("future"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Already at spec version 9.0.0"));
  assert_eq!(env.read_file("future/func.yaml"), newer);
}
