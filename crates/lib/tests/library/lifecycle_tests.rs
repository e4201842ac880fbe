//! A function's life from creation through builds and reloads.

use std::fs;

use fnkit_lib::init::{InitOptions, init};
use fnkit_lib::{Descriptor, ErrorKind};
use tempfile::TempDir;

use super::common::embedded_templates;

fn create(temp: &TempDir, runtime: &str) -> Descriptor {
  let options = InitOptions {
    root: temp.path().join("hello"),
    runtime: runtime.to_string(),
    registry: Some("alice".into()),
    ..Default::default()
  };
  init(&options, &embedded_templates()).unwrap()
}

mod create {
  use super::*;

  #[test]
  fn created_function_reloads_identically() {
    let temp = TempDir::new().unwrap();
    let f = create(&temp, "go");

    let reloaded = Descriptor::load(&f.root).unwrap();
    assert!(reloaded.initialized());
    assert_eq!(reloaded.name, "hello");
    assert_eq!(reloaded.runtime, "go");
    assert_eq!(reloaded.created, f.created);
    assert_eq!(reloaded.image_name().unwrap(), "docker.io/alice/hello:latest");
  }

  #[test]
  fn manifest_defaults_reach_the_descriptor() {
    let temp = TempDir::new().unwrap();
    let f = create(&temp, "go");

    assert_eq!(f.deploy.health_endpoints.liveness, "/health/liveness");
    assert_eq!(f.deploy.health_endpoints.readiness, "/health/readiness");
    assert!(f.build.builder_images.contains_key("pack"));
    assert!(f.build.build_envs.iter().any(|e| e.name.as_deref() == Some("BP_GO_TARGETS")));
  }

  #[test]
  fn second_create_is_a_conflict() {
    let temp = TempDir::new().unwrap();
    let f = create(&temp, "go");

    let options = InitOptions {
      root: f.root.clone(),
      runtime: "go".into(),
      ..Default::default()
    };
    let err = init(&options, &embedded_templates()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
  }

  #[test]
  fn unknown_runtime_is_reported() {
    let temp = TempDir::new().unwrap();
    let options = InitOptions {
      root: temp.path().join("hello"),
      runtime: "cobol".into(),
      ..Default::default()
    };
    let err = init(&options, &embedded_templates()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeNotFound);
  }
}

mod build {
  use super::*;

  #[test]
  fn stamp_survives_reload_until_sources_change() {
    let temp = TempDir::new().unwrap();
    let mut f = create(&temp, "node");
    assert!(!f.built());

    f.stamp().unwrap();
    let reloaded = Descriptor::load(&f.root).unwrap();
    assert!(reloaded.built());

    fs::write(f.root.join("extra.js"), "module.exports = {};\n").unwrap();
    assert!(!reloaded.built());
  }

  #[test]
  fn saving_an_unchanged_function_keeps_the_build() {
    let temp = TempDir::new().unwrap();
    let mut f = create(&temp, "go");
    f.stamp().unwrap();

    Descriptor::load(&f.root).unwrap().save().unwrap();
    assert!(f.built());
  }
}
