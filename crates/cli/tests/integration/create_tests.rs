//! Tests for `fnkit create`, `info`, `stamp`, `envs` and `templates`.

use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn create_writes_descriptor_and_template() {
  let env = TestEnv::new();
  env
    .cmd()
    .arg("create")
    .arg(env.path("myfn"))
    .args(["-l", "go", "--registry", "alice"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Created go function 'myfn'"))
    .stdout(predicate::str::contains("http"))
    .stdout(predicate::str::contains("docker.io/alice/myfn:latest"));

  let yaml = env.read_file("myfn/func.yaml");
  assert!(yaml.contains("name: myfn"));
  assert!(yaml.contains("runtime: go"));
  assert!(yaml.contains("created:"));
  assert!(env.path("myfn/handle.go").exists());
  assert!(env.path("myfn/.funcignore").exists());
  assert!(env.path("myfn/.func").is_dir());
  assert!(!env.path("myfn/manifest.yaml").exists());
  assert!(env.read_file("myfn/.gitignore").contains("/.func"));
}

#[test]
fn create_twice_fails() {
  let env = TestEnv::new();
  let path = env.create("myfn", "go");
  env
    .cmd()
    .arg("create")
    .arg(&path)
    .args(["-l", "go"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("already"));
}

#[test]
fn create_rejects_invalid_names() {
  let env = TestEnv::new();
  env
    .cmd()
    .arg("create")
    .arg(env.path("My_Func"))
    .args(["-l", "go"])
    .assert()
    .failure();
  assert!(!env.path("My_Func/func.yaml").exists());
}

#[test]
fn create_with_unknown_template_fails() {
  let env = TestEnv::new();
  env
    .cmd()
    .arg("create")
    .arg(env.path("myfn"))
    .args(["-l", "go", "-t", "nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("nope"));
}

#[test]
fn create_uses_global_language() {
  let env = TestEnv::new();
  env.cmd().args(["config", "set", "language", "node"]).assert().success();
  env.cmd().arg("create").arg(env.path("nodefn")).assert().success();
  assert!(env.read_file("nodefn/func.yaml").contains("runtime: node"));
  assert!(env.path("nodefn/index.js").exists());
}

#[test]
fn cloudevents_template_sets_invoke_hint() {
  let env = TestEnv::new();
  env
    .cmd()
    .arg("create")
    .arg(env.path("events"))
    .args(["-l", "go", "-t", "cloudevents"])
    .assert()
    .success();
  assert!(env.read_file("events/func.yaml").contains("invoke: cloudevent"));
}

#[test]
fn info_reports_function_and_build_state() {
  let env = TestEnv::new();
  let path = env.create("myfn", "go");

  env
    .cmd()
    .arg("info")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("myfn"))
    .stdout(predicate::str::contains("docker.io/alice/myfn:latest"))
    .stdout(predicate::str::contains("never"));

  env.cmd().arg("stamp").arg(&path).assert().success();

  env
    .cmd()
    .arg("info")
    .arg(&path)
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"built\": true"))
    .stdout(predicate::str::contains("\"builtImage\": \"docker.io/alice/myfn:latest\""));
}

#[test]
fn editing_sources_invalidates_build() {
  let env = TestEnv::new();
  let path = env.create("myfn", "go");
  env.cmd().arg("stamp").arg(&path).assert().success();

  env.write_file("myfn/extra.go", "package function\n");

  env
    .cmd()
    .arg("info")
    .arg(&path)
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"built\": false"));
}

const ENVS_FUNCTION: &str = "specVersion: 0.35.0
name: myfn
runtime: go
created: 2024-01-01T00:00:00Z
run:
  envs:
  - name: GREETING
    value: hello
  - name: FROM_LOCAL
    value: '{{ env:FNKIT_TEST_VALUE }}'
";

#[test]
fn envs_resolves_local_references() {
  let env = TestEnv::new();
  env.write_file("myfn/func.yaml", ENVS_FUNCTION);

  env
    .cmd()
    .arg("envs")
    .arg(env.path("myfn"))
    .env("FNKIT_TEST_VALUE", "resolved")
    .assert()
    .success()
    .stdout(predicate::str::contains("GREETING=hello"))
    .stdout(predicate::str::contains("FROM_LOCAL=resolved"));
}

#[test]
fn envs_fails_on_unset_local_reference() {
  let env = TestEnv::new();
  env.write_file("myfn/func.yaml", ENVS_FUNCTION);

  env
    .cmd()
    .arg("envs")
    .arg(env.path("myfn"))
    .env_remove("FNKIT_TEST_VALUE")
    .assert()
    .failure()
    .stderr(predicate::str::contains("FNKIT_TEST_VALUE"));
}

#[test]
fn templates_lists_embedded_runtimes() {
  let env = TestEnv::new();
  env
    .cmd()
    .arg("templates")
    .assert()
    .success()
    .stdout(predicate::str::contains("go"))
    .stdout(predicate::str::contains("python"))
    .stdout(predicate::str::contains("cloudevents"));
}

#[test]
fn templates_json_for_one_runtime() {
  let env = TestEnv::new();
  let output = env.cmd().args(["templates", "go", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let go = listing["go"].as_array().unwrap();
  assert!(go.contains(&serde_json::json!("http")));
  assert!(go.contains(&serde_json::json!("cloudevents")));
  assert!(listing.get("node").is_none());
}
