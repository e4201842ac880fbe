//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own global config file, repositories directory and
/// workspace for functions.
pub struct TestEnv {
  pub home: TempDir,
  pub work: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      home: TempDir::new().unwrap(),
      work: TempDir::new().unwrap(),
    }
  }

  pub fn config_file(&self) -> PathBuf {
    self.home.path().join("fnkit").join("config.yaml")
  }

  pub fn repositories_path(&self) -> PathBuf {
    self.home.path().join("fnkit").join("repositories")
  }

  /// Path of `name` inside the workspace.
  pub fn path(&self, name: &str) -> PathBuf {
    self.work.path().join(name)
  }

  /// Write a file relative to the workspace.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path)).unwrap()
  }

  /// A fnkit command isolated to this environment.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("fnkit");
    cmd
      .env("XDG_CONFIG_HOME", self.home.path())
      .env("FNKIT_CONFIG_FILE", self.config_file())
      .env("FNKIT_REPOSITORIES_PATH", self.repositories_path())
      .env_remove("RUST_LOG");
    cmd
  }

  /// Create a function named `name` in the workspace.
  pub fn create(&self, name: &str, language: &str) -> PathBuf {
    let path = self.path(name);
    self
      .cmd()
      .arg("create")
      .arg(&path)
      .args(["--language", language, "--registry", "alice"])
      .assert()
      .success();
    path
  }
}

/// Lay out a minimal template repository at `root` with one `go/custom`
/// template.
pub fn template_repository(root: &Path) {
  let custom = root.join("go").join("custom");
  std::fs::create_dir_all(&custom).unwrap();
  std::fs::write(custom.join("handle.go"), "package function\n").unwrap();
  std::fs::write(root.join("manifest.yaml"), "name: extras\n").unwrap();
}
