use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage medium of an `emptyDir` volume backed by node memory.
pub const STORAGE_MEDIUM_MEMORY: &str = "Memory";

/// A volume mounted into the running function.
///
/// Exactly one of the source fields must be set, together with `path`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Volume {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub secret: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub config_map: Option<String>,
  // The misspelling is part of the persisted format.
  #[serde(default, rename = "presistentVolumeClaim", skip_serializing_if = "Option::is_none")]
  pub persistent_volume_claim: Option<PersistentVolumeClaim>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub empty_dir: Option<EmptyDir>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersistentVolumeClaim {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub claim_name: Option<String>,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmptyDir {
  /// `""` for the node default or `"Memory"`.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub medium: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size_limit: Option<String>,
}

impl Volume {
  /// Number of volume sources set on this entry.
  pub fn source_count(&self) -> usize {
    [
      self.secret.is_some(),
      self.config_map.is_some(),
      self.persistent_volume_claim.is_some(),
      self.empty_dir.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count()
  }
}

impl fmt::Display for Volume {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(config_map) = &self.config_map {
      write!(f, "ConfigMap \"{config_map}\"")?;
    } else if let Some(secret) = &self.secret {
      write!(f, "Secret \"{secret}\"")?;
    } else if let Some(pvc) = &self.persistent_volume_claim {
      write!(f, "PersistentVolumeClaim")?;
      if let Some(claim) = &pvc.claim_name {
        write!(f, " \"{claim}\"")?;
      }
    } else if let Some(empty_dir) = &self.empty_dir {
      write!(f, "EmptyDir")?;
      if empty_dir.medium == STORAGE_MEDIUM_MEMORY {
        write!(f, " in memory")?;
      }
      if let Some(limit) = &empty_dir.size_limit {
        write!(f, " with size limit \"{limit}\"")?;
      }
    } else {
      write!(f, "No volume type")?;
    }
    if let Some(path) = &self.path {
      write!(f, " at path: \"{path}\"")?;
    }
    Ok(())
  }
}
