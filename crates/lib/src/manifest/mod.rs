//! Layered template defaults read from `manifest.yaml` files.
//!
//! A template repository may carry a manifest at three levels:
//!
//! ```text
//! <repository>/manifest.yaml                      repository defaults
//! <repository>/<templates>/<runtime>/manifest.yaml
//! <repository>/<templates>/<runtime>/<template>/manifest.yaml
//! ```
//!
//! Each level's effective config is its own manifest overlaid on the
//! effective config of its parent (see [`ManifestConfig::overlay`]). Lists
//! and maps are replaced wholesale, never merged. A missing manifest at any
//! level inherits the parent unchanged; a malformed one is an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::MANIFEST_FILE;
use crate::descriptor::Env;
use crate::fs::{self, Filesystem, FsError};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: FsError,
  },

  #[error("manifest {path} is not valid: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("templates path '{path}' does not exist in repository")]
  TemplatesPath { path: String },
}

/// Liveness and readiness endpoints, each inherited independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHealth {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub liveness: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub readiness: Option<String>,
}

/// Inheritable defaults declared by one manifest layer.
///
/// `None` means the layer does not define the field. `Some(vec![])` is a
/// definition and clears whatever the parent declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub buildpacks: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub builder_images: Option<BTreeMap<String, String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub health_endpoints: Option<ManifestHealth>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub build_envs: Option<Vec<Env>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub run_envs: Option<Vec<Env>>,

  /// Invocation format hint, e.g. `cloudevent`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub invoke: Option<String>,
}

impl ManifestConfig {
  /// Lay `child` over `self`: every field `child` defines wins.
  pub fn overlay(&self, child: &ManifestConfig) -> ManifestConfig {
    ManifestConfig {
      buildpacks: child.buildpacks.clone().or_else(|| self.buildpacks.clone()),
      builder_images: child.builder_images.clone().or_else(|| self.builder_images.clone()),
      health_endpoints: overlay_health(self.health_endpoints.as_ref(), child.health_endpoints.as_ref()),
      build_envs: child.build_envs.clone().or_else(|| self.build_envs.clone()),
      run_envs: child.run_envs.clone().or_else(|| self.run_envs.clone()),
      invoke: child.invoke.clone().or_else(|| self.invoke.clone()),
    }
  }

  /// Effective config of directory `dir`: its manifest, if any, over `self`.
  pub fn inherit(&self, fs: &dyn Filesystem, dir: &str) -> Result<ManifestConfig, ManifestError> {
    match read_manifest::<ManifestConfig>(fs, dir)? {
      Some(own) => Ok(self.overlay(&own)),
      None => Ok(self.clone()),
    }
  }

  pub fn liveness(&self) -> Option<&str> {
    self.health_endpoints.as_ref().and_then(|h| h.liveness.as_deref())
  }

  pub fn readiness(&self) -> Option<&str> {
    self.health_endpoints.as_ref().and_then(|h| h.readiness.as_deref())
  }
}

fn overlay_health(parent: Option<&ManifestHealth>, child: Option<&ManifestHealth>) -> Option<ManifestHealth> {
  match (parent, child) {
    (None, None) => None,
    (Some(p), None) => Some(p.clone()),
    (None, Some(c)) => Some(c.clone()),
    (Some(p), Some(c)) => Some(ManifestHealth {
      liveness: c.liveness.clone().or_else(|| p.liveness.clone()),
      readiness: c.readiness.clone().or_else(|| p.readiness.clone()),
    }),
  }
}

/// The repository-level manifest: shared defaults plus repository identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryManifest {
  /// Name declared by the repository author.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,

  /// Directory holding the runtimes, relative to the repository root.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub templates: Option<String>,

  #[serde(flatten)]
  pub config: ManifestConfig,
}

impl RepositoryManifest {
  /// Read the manifest at the root of `fs`. Missing means defaults.
  pub fn load(fs: &dyn Filesystem) -> Result<Self, ManifestError> {
    Ok(read_manifest(fs, ".")?.unwrap_or_default())
  }

  /// Templates directory, defaulting to the repository root.
  pub fn templates_path(&self) -> String {
    match self.templates.as_deref() {
      Some(path) if !path.trim().is_empty() => fs::clean(path),
      _ => ".".to_string(),
    }
  }
}

/// Effective config of a single template.
///
/// Walks repository, runtime and template manifests in order. Sibling
/// runtimes and templates are never read.
pub fn resolve(fs: &dyn Filesystem, runtime: &str, template: &str) -> Result<ManifestConfig, ManifestError> {
  let repo = RepositoryManifest::load(fs)?;
  let runtime_dir = fs::join(&repo.templates_path(), runtime);
  let runtime_cfg = repo.config.inherit(fs, &runtime_dir)?;
  runtime_cfg.inherit(fs, &fs::join(&runtime_dir, template))
}

fn read_manifest<T: for<'de> Deserialize<'de> + Default>(
  fs: &dyn Filesystem,
  dir: &str,
) -> Result<Option<T>, ManifestError> {
  let path = fs::join(dir, MANIFEST_FILE);
  let bytes = match fs::read_to_vec(fs, &path) {
    Ok(bytes) => bytes,
    Err(e) if e.is_not_found() => return Ok(None),
    Err(source) => return Err(ManifestError::Read { path, source }),
  };

  // An empty manifest defines nothing.
  if bytes.iter().all(u8::is_ascii_whitespace) {
    debug!(path = %path, "empty manifest");
    return Ok(Some(T::default()));
  }
  let parsed = serde_yaml::from_slice(&bytes).map_err(|source| ManifestError::Parse {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path, "loaded manifest");
  Ok(Some(parsed))
}
