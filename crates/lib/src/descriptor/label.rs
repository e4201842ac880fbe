use std::fmt;

use serde::{Deserialize, Serialize};

use super::env::Placeholder;

/// A label applied to the deployed function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Label {
  #[serde(default)]
  pub key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
}

impl Label {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      key: Some(key.into()),
      value: Some(value.into()),
    }
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.key, &self.value) {
      (Some(key), None) => write!(f, "Label with key \"{key}\""),
      (Some(key), Some(value)) => match Placeholder::parse(value) {
        Some(Placeholder::Env(local)) => {
          write!(f, "Label with key \"{key}\" and value set from local env variable \"{local}\"")
        }
        _ => write!(f, "Label with key \"{key}\" and value \"{value}\""),
      },
      _ => Ok(()),
    }
  }
}
