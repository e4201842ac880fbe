//! Environment entries and the placeholder forms their values may take.
//!
//! # Placeholder Formats
//!
//! - `{{ env:NAME }}` - value of a local environment variable, interpolated here
//! - `{{ secret:NAME }}` - every key of a secret (unnamed entries only)
//! - `{{ secret:NAME:KEY }}` - a single key of a secret
//! - `{{ configMap:NAME }}` - every key of a config map (unnamed entries only)
//! - `{{ configMap:NAME:KEY }}` - a single key of a config map
//!
//! Whitespace is allowed just inside the braces. Anything outside the braces
//! makes the value a literal. Secret and config map references are resolved
//! by the deployer, not here.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static WHOLE_SECRET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\{\{\s*secret:((?:\w|['-]\w)+)\s*\}\}$").expect("whole secret pattern is valid")
});
static KEY_FROM_SECRET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\{\{\s*secret:((?:\w|['-]\w)+):([-._a-zA-Z0-9]+)\s*\}\}$").expect("secret key pattern is valid")
});
static WHOLE_CONFIG_MAP: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\{\{\s*configMap:((?:\w|['-]\w)+)\s*\}\}$").expect("whole config map pattern is valid")
});
static KEY_FROM_CONFIG_MAP: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\{\{\s*configMap:((?:\w|['-]\w)+):([-._a-zA-Z0-9]+)\s*\}\}$").expect("config map key pattern is valid")
});
static LOCAL_ENV: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\{\{\s*env:(\w+)\s*\}\}$").expect("local env pattern is valid"));

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `{{ env:NAME }}`
  Env(String),

  /// `{{ secret:NAME }}`
  Secret(String),

  /// `{{ secret:NAME:KEY }}`
  SecretKey { name: String, key: String },

  /// `{{ configMap:NAME }}`
  ConfigMap(String),

  /// `{{ configMap:NAME:KEY }}`
  ConfigMapKey { name: String, key: String },
}

impl Placeholder {
  /// Parse a value as a placeholder. Returns `None` for literals and for
  /// values that merely look like placeholders.
  pub fn parse(value: &str) -> Option<Self> {
    if let Some(c) = LOCAL_ENV.captures(value) {
      return Some(Placeholder::Env(c[1].to_string()));
    }
    if let Some(c) = WHOLE_SECRET.captures(value) {
      return Some(Placeholder::Secret(c[1].to_string()));
    }
    if let Some(c) = KEY_FROM_SECRET.captures(value) {
      return Some(Placeholder::SecretKey {
        name: c[1].to_string(),
        key: c[2].to_string(),
      });
    }
    if let Some(c) = WHOLE_CONFIG_MAP.captures(value) {
      return Some(Placeholder::ConfigMap(c[1].to_string()));
    }
    if let Some(c) = KEY_FROM_CONFIG_MAP.captures(value) {
      return Some(Placeholder::ConfigMapKey {
        name: c[1].to_string(),
        key: c[2].to_string(),
      });
    }
    None
  }

  /// Whether the placeholder pulls in every key of a secret or config map.
  pub fn is_whole(&self) -> bool {
    matches!(self, Placeholder::Secret(_) | Placeholder::ConfigMap(_))
  }
}

/// Whether `value` is opened like a placeholder.
pub fn looks_like_placeholder(value: &str) -> bool {
  value.starts_with("{{")
}

/// An environment variable entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Env {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
}

impl Env {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      value: Some(value.into()),
    }
  }

  /// An unnamed entry pulling in a whole secret or config map.
  pub fn unnamed(value: impl Into<String>) -> Self {
    Self {
      name: None,
      value: Some(value.into()),
    }
  }

  /// `NAME=VALUE`, or an empty string for unnamed entries.
  pub fn key_value_pair(&self) -> String {
    match &self.name {
      Some(name) => format!("{}={}", name, self.value.as_deref().unwrap_or("")),
      None => String::new(),
    }
  }
}

impl fmt::Display for Env {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (name, value) = match (&self.name, &self.value) {
      (name, Some(value)) => (name, value),
      _ => return Ok(()),
    };
    match (name, Placeholder::parse(value)) {
      (None, Some(Placeholder::Secret(s))) => write!(f, "All key=value pairs from Secret \"{s}\""),
      (None, Some(Placeholder::ConfigMap(c))) => write!(f, "All key=value pairs from ConfigMap \"{c}\""),
      (None, _) => Ok(()),
      (Some(n), Some(Placeholder::SecretKey { name, key })) => {
        write!(f, "Env \"{n}\" with value set from key \"{key}\" from Secret \"{name}\"")
      }
      (Some(n), Some(Placeholder::ConfigMapKey { name, key })) => {
        write!(f, "Env \"{n}\" with value set from key \"{key}\" from ConfigMap \"{name}\"")
      }
      (Some(n), Some(Placeholder::Env(local))) => {
        write!(f, "Env \"{n}\" with value set from local env variable \"{local}\"")
      }
      (Some(n), _) => write!(f, "Env \"{n}\" with value \"{value}\""),
    }
  }
}

/// Errors raised while interpolating environment entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
  #[error("env name may not be nil")]
  NameRequired,

  #[error("expected environment variable '{0}' not found")]
  NotFound(String),
}

/// Source of local environment values.
pub trait EnvLookup {
  fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads the current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
  fn lookup(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }
}

impl<F> EnvLookup for F
where
  F: Fn(&str) -> Option<String>,
{
  fn lookup(&self, name: &str) -> Option<String> {
    self(name)
  }
}

/// Interpolate entries against the process environment.
pub fn interpolate(envs: &[Env]) -> Result<BTreeMap<String, String>, EnvError> {
  interpolate_with(envs, &ProcessEnv)
}

/// Interpolate entries into a name to value map.
///
/// Entries without a value are skipped. Literal values and non-`env`
/// placeholders are passed through unchanged. `{{ env:NAME }}` is replaced by
/// the looked-up value and fails if it is unset.
pub fn interpolate_with(envs: &[Env], lookup: &impl EnvLookup) -> Result<BTreeMap<String, String>, EnvError> {
  let mut out = BTreeMap::new();
  for env in envs {
    let name = env.name.as_ref().ok_or(EnvError::NameRequired)?;
    let Some(value) = &env.value else {
      continue;
    };

    let resolved = match Placeholder::parse(value) {
      Some(Placeholder::Env(local)) => lookup.lookup(&local).ok_or(EnvError::NotFound(local))?,
      _ => value.clone(),
    };
    out.insert(name.clone(), resolved);
  }
  Ok(out)
}
