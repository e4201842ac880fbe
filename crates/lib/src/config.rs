//! Global settings shared by every function on this machine.
//!
//! Stored as `config.yaml` in the user config directory (see
//! [`crate::paths`]). Every setting is optional and a missing file means
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::DEFAULT_BUILDER;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::paths;
use crate::rundata::{read_optional, write_atomic};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("global config {} is not valid: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("global config {} does not exist", .0.display())]
  NotFound(PathBuf),

  #[error("field not found on global config: {0}")]
  UnknownKey(String),

  #[error("invalid value '{value}' for {key}: expected true or false")]
  InvalidBool { key: String, value: String },

  #[error("no configuration directory available; set HOME or XDG_CONFIG_HOME")]
  NoConfigDir,
}

/// Global configuration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Global {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub builder: String,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub confirm: bool,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub language: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub namespace: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub registry: String,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub verbose: bool,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub registry_insecure: bool,
}

const KEYS: [&str; 7] = [
  "builder",
  "confirm",
  "language",
  "namespace",
  "registry",
  "registryInsecure",
  "verbose",
];

impl Global {
  /// Static defaults, ignoring any config file.
  pub fn new() -> Self {
    Self {
      builder: DEFAULT_BUILDER.to_string(),
      ..Default::default()
    }
  }

  /// Static defaults overlaid with the config file, if there is one.
  pub fn new_default() -> Result<Self> {
    let Some(path) = paths::config_file() else {
      return Ok(Self::new());
    };
    let Some(text) = read_optional(&path)? else {
      debug!(path = %path.display(), "no global config file");
      return Ok(Self::new());
    };
    let file: Global = parse(&path, &text)?;
    Ok(Self::new().overlay(file))
  }

  /// The config file at `path` exactly as written, without defaults.
  pub fn load(path: &Path) -> Result<Self> {
    match read_optional(path)? {
      Some(text) => parse(path, &text),
      None => Err(ConfigError::NotFound(path.to_path_buf()).into()),
    }
  }

  pub fn write(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }
    let text = serde_yaml::to_string(self).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    write_atomic(path, text.as_bytes())
  }

  /// Global settings overridden by whatever `f` sets.
  pub fn apply(&self, f: &Descriptor) -> Self {
    let mut c = self.clone();
    if !f.build.builder.is_empty() {
      c.builder = f.build.builder.clone();
    }
    if !f.runtime.is_empty() {
      c.language = f.runtime.clone();
    }
    if !f.deploy.namespace.is_empty() {
      c.namespace = f.deploy.namespace.clone();
    }
    if !f.registry.is_empty() {
      c.registry = f.registry.clone();
    }
    c
  }

  /// `f` overridden by whatever these settings set.
  pub fn configure(&self, mut f: Descriptor) -> Descriptor {
    if !self.builder.is_empty() {
      f.build.builder = self.builder.clone();
    }
    if !self.language.is_empty() {
      f.runtime = self.language.clone();
    }
    if !self.namespace.is_empty() {
      f.deploy.namespace = self.namespace.clone();
    }
    if !self.registry.is_empty() {
      f.registry = self.registry.clone();
    }
    f
  }

  /// Settable keys, sorted.
  pub fn keys() -> &'static [&'static str] {
    &KEYS
  }

  pub fn get(&self, key: &str) -> Result<String, ConfigError> {
    Ok(match key {
      "builder" => self.builder.clone(),
      "confirm" => self.confirm.to_string(),
      "language" => self.language.clone(),
      "namespace" => self.namespace.clone(),
      "registry" => self.registry.clone(),
      "registryInsecure" => self.registry_insecure.to_string(),
      "verbose" => self.verbose.to_string(),
      _ => return Err(ConfigError::UnknownKey(key.to_string())),
    })
  }

  /// Set a key from its textual form. Boolean keys accept the usual
  /// spellings of true and false.
  pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
      "builder" => self.builder = value.to_string(),
      "language" => self.language = value.to_string(),
      "namespace" => self.namespace = value.to_string(),
      "registry" => self.registry = value.to_string(),
      "confirm" => self.confirm = parse_bool(key, value)?,
      "registryInsecure" => self.registry_insecure = parse_bool(key, value)?,
      "verbose" => self.verbose = parse_bool(key, value)?,
      _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
  }

  fn overlay(mut self, file: Global) -> Self {
    if !file.builder.is_empty() {
      self.builder = file.builder;
    }
    self.confirm |= file.confirm;
    self.language = pick(self.language, file.language);
    self.namespace = pick(self.namespace, file.namespace);
    self.registry = pick(self.registry, file.registry);
    self.verbose |= file.verbose;
    self.registry_insecure |= file.registry_insecure;
    self
  }
}

fn pick(current: String, file: String) -> String {
  if file.is_empty() { current } else { file }
}

fn parse(path: &Path, text: &str) -> Result<Global> {
  if text.trim().is_empty() {
    return Ok(Global::default());
  }
  serde_yaml::from_str(text).map_err(|source| {
    ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    }
    .into()
  })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value {
    "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
    "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
    _ => Err(ConfigError::InvalidBool {
      key: key.to_string(),
      value: value.to_string(),
    }),
  }
}

/// Path of the global config file.
pub fn file() -> Result<PathBuf> {
  paths::config_file().ok_or_else(|| ConfigError::NoConfigDir.into())
}

/// Path of the installed repositories.
pub fn repositories_path() -> Option<PathBuf> {
  paths::repositories_path()
}

/// Create the config directory and the repositories directory inside it.
pub fn create_paths() -> Result<()> {
  let dir = paths::config_dir().ok_or(ConfigError::NoConfigDir)?;
  fs::create_dir_all(&dir).map_err(|e| Error::io("create directory", &dir, e))?;
  if let Some(repos) = paths::repositories_path() {
    fs::create_dir_all(&repos).map_err(|e| Error::io("create directory", &repos, e))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  #[serial]
  fn defaults_without_file() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("config.yaml");
    temp_env::with_vars([(paths::CONFIG_FILE_ENV, Some(missing.as_os_str()))], || {
      let cfg = Global::new_default().unwrap();
      assert_eq!(cfg.builder, "pack");
      assert!(!cfg.confirm);
    });
  }

  #[test]
  #[serial]
  fn file_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.yaml");
    fs::write(&path, "registry: quay.io/alice\nregistryInsecure: true\n").unwrap();
    temp_env::with_vars([(paths::CONFIG_FILE_ENV, Some(path.as_os_str()))], || {
      let cfg = Global::new_default().unwrap();
      assert_eq!(cfg.builder, "pack");
      assert_eq!(cfg.registry, "quay.io/alice");
      assert!(cfg.registry_insecure);
    });
  }

  #[test]
  fn load_is_exact_and_requires_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.yaml");
    assert_eq!(Global::load(&path).unwrap_err().kind(), ErrorKind::Config);

    fs::write(&path, "language: go\n").unwrap();
    let cfg = Global::load(&path).unwrap();
    assert_eq!(cfg.language, "go");
    assert_eq!(cfg.builder, "");
  }

  #[test]
  fn write_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/config.yaml");
    let mut cfg = Global::new();
    cfg.set("verbose", "true").unwrap();
    cfg.set("namespace", "prod").unwrap();
    cfg.write(&path).unwrap();

    assert_eq!(Global::load(&path).unwrap(), cfg);
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("confirm"));
  }

  #[test]
  fn malformed_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.yaml");
    fs::write(&path, "verbose: [\n").unwrap();
    assert_eq!(Global::load(&path).unwrap_err().kind(), ErrorKind::Config);
  }

  #[test]
  fn apply_and_configure_are_inverse_directions() {
    let cfg = Global {
      builder: "pack".into(),
      registry: "docker.io/global".into(),
      ..Default::default()
    };
    let mut f = Descriptor::default();
    f.registry = "quay.io/local".into();
    f.runtime = "go".into();

    let applied = cfg.apply(&f);
    assert_eq!(applied.registry, "quay.io/local");
    assert_eq!(applied.language, "go");
    assert_eq!(applied.builder, "pack");

    let configured = cfg.configure(f);
    assert_eq!(configured.registry, "docker.io/global");
    assert_eq!(configured.runtime, "go");
    assert_eq!(configured.build.builder, "pack");
  }

  #[test]
  fn keys_are_sorted_and_settable() {
    let keys = Global::keys();
    let mut sorted = keys.to_vec();
    sorted.sort();
    assert_eq!(keys, sorted.as_slice());

    let mut cfg = Global::default();
    for key in keys {
      assert!(cfg.get(key).is_ok());
    }
    assert!(matches!(cfg.set("nope", "x"), Err(ConfigError::UnknownKey(_))));
    assert!(matches!(cfg.set("confirm", "yes"), Err(ConfigError::InvalidBool { .. })));
    cfg.set("confirm", "T").unwrap();
    assert_eq!(cfg.get("confirm").unwrap(), "true");
  }

  #[test]
  #[serial]
  fn create_paths_makes_directories() {
    let temp = TempDir::new().unwrap();
    temp_env::with_vars(
      [
        ("XDG_CONFIG_HOME", Some(temp.path().as_os_str())),
        (paths::REPOSITORIES_PATH_ENV, None),
      ],
      || {
        create_paths().unwrap();
        assert!(temp.path().join("fnkit/repositories").is_dir());
      },
    );
  }
}
