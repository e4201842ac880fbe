//! The function descriptor (`func.yaml`) and its data model.
//!
//! A [`Descriptor`] is created empty by [`Descriptor::new_with`], populated
//! when a template is materialized, persisted with [`Descriptor::save`] and
//! re-loaded (and migrated) with [`Descriptor::load`].
//!
//! Loading and saving live in `codec`, schema upgrades in
//! [`crate::migration`], and build staleness in [`crate::fingerprint`].

mod codec;
mod env;
mod label;
mod options;
pub mod validate;
mod volume;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use env::{Env, EnvError, EnvLookup, Placeholder, ProcessEnv, interpolate, interpolate_with, looks_like_placeholder};
pub use label::Label;
pub use options::{Options, ResourceLimits, ResourceRequests, ResourcesOptions, ScaleOptions};
pub use validate::ValidationErrors;
pub use volume::{EmptyDir, PersistentVolumeClaim, STORAGE_MEDIUM_MEMORY, Volume};

use crate::consts::{DEFAULT_PVC_SIZE, DEFAULT_REGISTRY, DEFAULT_TEMPLATE};
use crate::error::{Error, Result};
use crate::migration;
use crate::rundata::LocalSettings;

/// Label marking a workload as a function.
pub const FUNCTION_LABEL_KEY: &str = "function.knative.dev";
pub const FUNCTION_LABEL_VALUE: &str = "true";
pub const FUNCTION_NAME_LABEL_KEY: &str = "function.knative.dev/name";
pub const FUNCTION_RUNTIME_LABEL_KEY: &str = "function.knative.dev/runtime";

/// Persisted project metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Descriptor {
  /// Highest schema migration applied. Semver.
  #[serde(default)]
  pub spec_version: String,

  /// Project directory. Supplied at load time.
  #[serde(skip)]
  pub root: PathBuf,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name: String,

  /// Language runtime, e.g. `go` or `node`.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub runtime: String,

  /// Template the project is created from. Only meaningful at creation.
  #[serde(skip)]
  pub template: String,

  /// Image namespace in the form `[registry/]namespace`.
  #[serde(default)]
  pub registry: String,

  /// Explicit image reference, overriding the one derived from the registry.
  #[serde(default)]
  pub image: String,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub image_digest: String,

  /// When creation completed. Unset means not initialized.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created: Option<DateTime<Utc>>,

  /// Invocation format hint. Empty means `http`.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub invoke: String,

  #[serde(default, skip_serializing_if = "BuildSpec::is_empty")]
  pub build: BuildSpec,

  #[serde(default, skip_serializing_if = "RunSpec::is_empty")]
  pub run: RunSpec,

  #[serde(default, skip_serializing_if = "DeploySpec::is_empty")]
  pub deploy: DeploySpec,

  /// Settings kept in the runtime-data directory, never in `func.yaml`.
  #[serde(skip)]
  pub local: LocalSettings,

  /// Last recorded build stamp, if any.
  #[serde(skip)]
  pub build_stamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildSpec {
  #[serde(default, skip_serializing_if = "Git::is_empty")]
  pub git: Git,

  /// Builder image overrides keyed by builder short name (`pack`, `s2i`).
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub builder_images: BTreeMap<String, String>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub buildpacks: Vec<String>,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub builder: String,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub build_envs: Vec<Env>,

  /// Size of the volume claim used by remote builds.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub pvc_size: String,
}

impl BuildSpec {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// Source repository associated with the function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Git {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub url: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub revision: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub context_dir: String,
}

impl Git {
  pub fn is_empty(&self) -> bool {
    self.url.is_empty() && self.revision.is_empty() && self.context_dir.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunSpec {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub volumes: Vec<Volume>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub envs: Vec<Env>,
}

impl RunSpec {
  pub fn is_empty(&self) -> bool {
    self.volumes.is_empty() && self.envs.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeploySpec {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub namespace: String,

  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub annotations: BTreeMap<String, String>,

  #[serde(default, skip_serializing_if = "Options::is_empty")]
  pub options: Options,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub labels: Vec<Label>,

  #[serde(default, skip_serializing_if = "HealthEndpoints::is_empty")]
  pub health_endpoints: HealthEndpoints,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub service_account_name: String,
}

impl DeploySpec {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// Liveness and readiness probe paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthEndpoints {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub liveness: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub readiness: String,
}

impl HealthEndpoints {
  pub fn is_empty(&self) -> bool {
    self.liveness.is_empty() && self.readiness.is_empty()
  }
}

impl Descriptor {
  /// A new descriptor from `defaults`, filling in what creation requires.
  pub fn new_with(mut defaults: Descriptor) -> Self {
    if defaults.spec_version.is_empty() {
      defaults.spec_version = migration::latest_version().to_string();
    }
    if defaults.template.is_empty() {
      defaults.template = DEFAULT_TEMPLATE.to_string();
    }
    if defaults.build.pvc_size.is_empty() {
      defaults.build.pvc_size = DEFAULT_PVC_SIZE.to_string();
    }
    defaults
  }

  /// Whether creation of this function completed.
  pub fn initialized(&self) -> bool {
    self.created.is_some()
  }

  /// Image reference derived from registry and name.
  ///
  /// A single-token registry names a namespace on the default registry:
  ///
  /// | registry                | image                                  |
  /// |-------------------------|----------------------------------------|
  /// | `alice`                 | `docker.io/alice/<name>:latest`        |
  /// | `quay.io/alice`         | `quay.io/alice/<name>:latest`          |
  /// | `quay.io/project/alice` | `quay.io/project/alice/<name>:latest`  |
  pub fn image_name(&self) -> Result<String> {
    if self.registry.is_empty() {
      return Err(Error::RegistryRequired);
    }
    if self.name.is_empty() {
      return Err(Error::NameRequired);
    }

    let registry = self.registry.trim_matches('/');
    let image = match registry.split('/').count() {
      1 => format!("{DEFAULT_REGISTRY}/{registry}/{}", self.name),
      2 | 3 => format!("{registry}/{}", self.name),
      _ => return Err(Error::InvalidRegistry(self.registry.clone())),
    };
    Ok(format!("{image}:latest"))
  }

  /// `image` pinned to `image_digest`, replacing any tag or earlier digest.
  pub fn image_with_digest(&self) -> String {
    if self.image_digest.is_empty() {
      return self.image.clone();
    }
    if let Some(idx) = self.image.find("@sha256:")
      && idx > 0
    {
      return format!("{}@{}", &self.image[..idx], self.image_digest);
    }
    let (prefix, last) = match self.image.rfind('/') {
      Some(idx) => self.image.split_at(idx + 1),
      None => ("", self.image.as_str()),
    };
    let repository = last.split(':').next().unwrap_or(last);
    format!("{prefix}{repository}@{}", self.image_digest)
  }

  /// Labels applied to the deployed function: defaults first, then user
  /// labels with `{{ env:NAME }}` values resolved from the process env.
  pub fn labels_map(&self) -> Result<BTreeMap<String, String>> {
    let mut labels = vec![
      Label::new(FUNCTION_LABEL_KEY, FUNCTION_LABEL_VALUE),
      Label::new(FUNCTION_NAME_LABEL_KEY, self.name.clone()),
      Label::new(FUNCTION_RUNTIME_LABEL_KEY, self.runtime.clone()),
    ];
    labels.extend(self.deploy.labels.iter().cloned());

    let lookup = |name: &str| std::env::var(name).ok();
    let mut errors = ValidationErrors::default();
    errors.extend(validate::validate_labels(&labels, &lookup));
    if !errors.is_empty() {
      return Err(errors.into());
    }

    let mut map = BTreeMap::new();
    for label in labels {
      let Some(key) = label.key else {
        continue;
      };
      let value = match label.value {
        None => String::new(),
        Some(value) => match Placeholder::parse(&value) {
          Some(Placeholder::Env(local)) => lookup(&local).unwrap_or_default(),
          _ => value,
        },
      };
      map.insert(key, value);
    }
    Ok(map)
  }

  /// Run every validation rule, aggregating the failures.
  pub fn validate(&self) -> Result<()> {
    if self.root.as_os_str().is_empty() {
      return Err(Error::RootRequired);
    }
    validate::validate(self)?;
    Ok(())
  }
}
