//! Tests for `fnkit repository` and templates from installed repositories.

use predicates::prelude::*;

use crate::common::{TestEnv, template_repository};

#[test]
fn list_without_installed_repositories_shows_default() {
  let env = TestEnv::new();
  env
    .cmd()
    .args(["repository", "list"])
    .assert()
    .success()
    .stdout(predicate::str::diff("default\n"));
}

#[test]
fn add_list_rename_remove_cycle() {
  let env = TestEnv::new();
  let source = env.path("source-repo");
  template_repository(&source);

  env
    .cmd()
    .args(["repository", "add", "--name", "extra"])
    .arg(&source)
    .assert()
    .success()
    .stdout(predicate::str::contains("extra"));
  assert!(env.repositories_path().join("extra/go/custom/handle.go").exists());

  env
    .cmd()
    .args(["repository", "list"])
    .assert()
    .success()
    .stdout(predicate::str::diff("default\nextra\n"));

  env
    .cmd()
    .args(["templates", "go"])
    .assert()
    .success()
    .stdout(predicate::str::contains("extra/custom"));

  env
    .cmd()
    .args(["repository", "rename", "extra", "more"])
    .assert()
    .success();
  assert!(env.repositories_path().join("more").is_dir());
  assert!(!env.repositories_path().join("extra").exists());

  env.cmd().args(["repository", "remove", "more"]).assert().success();
  env
    .cmd()
    .args(["repository", "list"])
    .assert()
    .success()
    .stdout(predicate::str::diff("default\n"));
}

#[test]
fn add_without_name_uses_manifest_name() {
  let env = TestEnv::new();
  let source = env.path("source-repo");
  template_repository(&source);

  env
    .cmd()
    .args(["repository", "add"])
    .arg(&source)
    .assert()
    .success();
  assert!(env.repositories_path().join("extras").is_dir());
}

#[test]
fn add_duplicate_fails() {
  let env = TestEnv::new();
  let source = env.path("source-repo");
  template_repository(&source);

  for expect_success in [true, false] {
    let assert = env
      .cmd()
      .args(["repository", "add", "--name", "extra"])
      .arg(&source)
      .assert();
    if expect_success {
      assert.success();
    } else {
      assert.failure();
    }
  }
}

#[test]
fn remove_missing_repository_fails() {
  let env = TestEnv::new();
  env
    .cmd()
    .args(["repository", "remove", "ghost"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("ghost"));
}

#[test]
fn create_from_installed_repository_template() {
  let env = TestEnv::new();
  let source = env.path("source-repo");
  template_repository(&source);
  env
    .cmd()
    .args(["repository", "add", "--name", "extra"])
    .arg(&source)
    .assert()
    .success();

  env
    .cmd()
    .arg("create")
    .arg(env.path("myfn"))
    .args(["-l", "go", "-t", "extra/custom"])
    .assert()
    .success()
    .stdout(predicate::str::contains("extra/custom"));
  assert!(env.path("myfn/handle.go").exists());
}

#[test]
fn single_repository_mode_uses_only_the_given_uri() {
  let env = TestEnv::new();
  let source = env.path("source-repo");
  template_repository(&source);

  env
    .cmd()
    .args(["templates", "go", "-r"])
    .arg(&source)
    .assert()
    .success()
    .stdout(predicate::str::contains("custom"))
    .stdout(predicate::str::contains("cloudevents").not());
}
