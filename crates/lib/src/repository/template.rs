//! A single template and its materialization into a function root.

use tracing::info;

use crate::consts::{DEFAULT_INVOKE, MANIFEST_FILE};
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::fs::{self, Filesystem, MaskingFs, SubFs};
use crate::manifest::ManifestConfig;

/// A template: a directory of source files plus its resolved defaults.
#[derive(Debug, Clone)]
pub struct Template {
  pub(crate) name: String,
  pub(crate) runtime: String,
  pub(crate) repository: String,
  pub(crate) config: ManifestConfig,
  pub(crate) fs: SubFs,
}

impl Template {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn runtime(&self) -> &str {
    &self.runtime
  }

  /// Effective name of the containing repository. Not canonical: it is
  /// `default` for the single repository in single-repository mode.
  pub fn repository(&self) -> &str {
    &self.repository
  }

  /// `repository/name`, unique across repositories.
  pub fn fullname(&self) -> String {
    format!("{}/{}", self.repository, self.name)
  }

  /// Defaults resolved through the repository, runtime and template
  /// manifests.
  pub fn config(&self) -> &ManifestConfig {
    &self.config
  }

  /// Files of this template, rooted at its directory.
  pub fn fs(&self) -> &dyn Filesystem {
    &self.fs
  }

  /// Apply this template's defaults to `f` and copy its files into `f.root`.
  ///
  /// Only fields `f` leaves unset are filled in. Manifest files are never
  /// copied, at any depth.
  pub fn write(&self, f: &mut Descriptor) -> Result<()> {
    self.denormalize(f);

    info!(
      repository = %self.repository,
      runtime = %self.runtime,
      template = %self.name,
      path = %f.root.display(),
      "writing template"
    );
    let masked = MaskingFs::new(|path| fs::base_name(path) == MANIFEST_FILE, &self.fs);
    fs::copy_from_fs(".", &f.root, &masked)?;
    Ok(())
  }

  fn denormalize(&self, f: &mut Descriptor) {
    let cfg = &self.config;
    if f.build.builder_images.is_empty() {
      f.build.builder_images = cfg.builder_images.clone().unwrap_or_default();
    }
    if f.build.buildpacks.is_empty() {
      f.build.buildpacks = cfg.buildpacks.clone().unwrap_or_default();
    }
    if f.build.build_envs.is_empty() {
      f.build.build_envs = cfg.build_envs.clone().unwrap_or_default();
    }
    if f.run.envs.is_empty() {
      f.run.envs = cfg.run_envs.clone().unwrap_or_default();
    }
    if f.deploy.health_endpoints.liveness.is_empty() {
      f.deploy.health_endpoints.liveness = cfg.liveness().unwrap_or_default().to_string();
    }
    if f.deploy.health_endpoints.readiness.is_empty() {
      f.deploy.health_endpoints.readiness = cfg.readiness().unwrap_or_default().to_string();
    }
    if f.invoke.is_empty() {
      match cfg.invoke.as_deref() {
        Some(invoke) if invoke != DEFAULT_INVOKE => f.invoke = invoke.to_string(),
        _ => {}
      }
    }
  }
}
