//! Schema migrations for `func.yaml`.
//!
//! Every migration is keyed by the spec version it upgrades a descriptor
//! to and runs only against descriptors stamped below that version. A
//! descriptor without a stamp is treated as version `0.0.0`, so the whole
//! chain runs. Migrations read legacy fields from the raw document, which
//! the strict decoder cannot see, and never lower the stamp.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use semver::Version;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::consts::FUNCTION_FILE;
use crate::descriptor::{Descriptor, Env, Git, HealthEndpoints, Label, Options, Volume};
use crate::error::Result;

/// A failed migration, naming the step that failed.
#[derive(Debug, Error)]
#[error("migration '{migration}' error: {source}")]
pub struct MigrationError {
  pub migration: &'static str,
  #[source]
  pub source: MigrationFailure,
}

#[derive(Debug, Error)]
pub enum MigrationFailure {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{0}")]
  Parse(#[from] serde_yaml::Error),

  #[error("field '{key}' is not valid: {source}")]
  Field {
    key: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("invalid spec version '{version}': {source}")]
  Version {
    version: String,
    #[source]
    source: semver::Error,
  },
}

type Migrator = fn(Descriptor, &LegacyDocument) -> Result<Descriptor, MigrationFailure>;

struct Migration {
  version: &'static str,
  name: &'static str,
  apply: Migrator,
}

/// Registered migrations in ascending version order. Versions are unique.
static MIGRATIONS: &[Migration] = &[
  Migration {
    version: "0.19.0",
    name: "migrateToCreationStamp",
    apply: to_creation_stamp,
  },
  Migration {
    version: "0.23.0",
    name: "migrateToBuilderImages",
    apply: to_builder_images,
  },
  Migration {
    version: "0.25.0",
    name: "migrateToSpecVersion",
    apply: to_spec_version,
  },
  Migration {
    version: "0.34.0",
    name: "migrateToSpecsStructure",
    apply: to_specs_structure,
  },
  Migration {
    version: "0.35.0",
    name: "migrateFromInvokeStructure",
    apply: from_invoke_structure,
  },
];

/// Version reached by the last registered migration.
pub fn latest_version() -> &'static str {
  MIGRATIONS.last().map(|m| m.version).unwrap_or("0.0.0")
}

/// Keys which only exist in descriptors older than the grouped layout.
pub(crate) const LEGACY_KEYS: &[&str] = &[
  "version",
  "builder",
  "builders",
  "trigger",
  "namespace",
  "git",
  "builderImages",
  "buildpacks",
  "buildEnvs",
  "volumes",
  "envs",
  "annotations",
  "options",
  "labels",
  "healthEndpoints",
  "invocation",
];

/// Image the pack builder defaulted to when `builder` still held an image.
const LEGACY_DEFAULT_PACK_BUILDER: &str = "gcr.io/paketo-buildpacks/builder:base";

/// The raw `func.yaml` mapping, as written by whatever version produced it.
#[derive(Debug, Clone, Default)]
pub struct LegacyDocument(Mapping);

impl LegacyDocument {
  pub fn new(mapping: Mapping) -> Self {
    Self(mapping)
  }

  /// A document from any YAML value. Anything but a mapping is empty.
  pub fn from_value(value: &Value) -> Self {
    match value {
      Value::Mapping(m) => Self(m.clone()),
      _ => Self::default(),
    }
  }

  /// Read `func.yaml` from `root`. A missing file is an empty document.
  pub fn read(root: &Path) -> Result<Self, MigrationFailure> {
    let path = root.join(FUNCTION_FILE);
    let text = match std::fs::read_to_string(&path) {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => return Err(MigrationFailure::Read { path, source }),
    };
    if text.trim().is_empty() {
      return Ok(Self::default());
    }
    let value: Value = serde_yaml::from_str(&text)?;
    Ok(Self::from_value(&value))
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key).filter(|v| !v.is_null())
  }

  /// Decode `key` into `T`. Absent and null keys are `None`.
  pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, MigrationFailure> {
    let Some(value) = self.get(key) else {
      return Ok(None);
    };
    serde_yaml::from_value(value.clone())
      .map(Some)
      .map_err(|source| MigrationFailure::Field {
        key: key.to_string(),
        source,
      })
  }

  /// A scalar rendered as text, whatever YAML type it was written as.
  pub fn scalar(&self, key: &str) -> Option<String> {
    match self.get(key)? {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }
}

fn parse_version(version: &str) -> Result<Version, MigrationFailure> {
  if version.is_empty() {
    return Ok(Version::new(0, 0, 0));
  }
  Version::parse(version).map_err(|source| MigrationFailure::Version {
    version: version.to_string(),
    source,
  })
}

impl Descriptor {
  /// Whether the descriptor is stamped at or above the latest migration.
  pub fn migrated(&self) -> bool {
    if self.spec_version.is_empty() {
      return false;
    }
    match (parse_version(&self.spec_version), parse_version(latest_version())) {
      (Ok(current), Ok(latest)) => current >= latest,
      _ => false,
    }
  }

  /// Apply pending migrations, reading legacy fields from the descriptor's
  /// `func.yaml` on disk.
  pub fn migrate(self) -> Result<Self> {
    if self.migrated() {
      return Ok(self);
    }
    let doc = if self.root.as_os_str().is_empty() {
      LegacyDocument::default()
    } else {
      LegacyDocument::read(&self.root).map_err(|source| MigrationError {
        migration: "read",
        source,
      })?
    };
    Ok(self.migrate_with(&doc)?)
  }

  /// Apply pending migrations using `doc` as the legacy source.
  pub fn migrate_with(self, doc: &LegacyDocument) -> Result<Self, MigrationError> {
    if self.migrated() {
      return Ok(self);
    }

    let mut f = self;
    for m in MIGRATIONS {
      let wrap = |source| MigrationError {
        migration: m.name,
        source,
      };
      let current = parse_version(&f.spec_version).map_err(wrap)?;
      let target = parse_version(m.version).map_err(wrap)?;
      if !f.spec_version.is_empty() && current >= target {
        trace!(migration = m.name, "already applied");
        continue;
      }

      debug!(migration = m.name, from = %current, to = m.version, "applying migration");
      f = (m.apply)(f, doc).map_err(wrap)?;
      f.spec_version = m.version.to_string();
    }
    Ok(f)
  }
}

/// Builder values which name an image rather than a builder implementation.
fn looks_like_image(builder: &str) -> bool {
  builder.contains('/') || builder.contains(':')
}

/// Functions created before versioning have a name and runtime but no
/// creation stamp. In-memory functions still being created are left alone.
fn to_creation_stamp(mut f: Descriptor, _doc: &LegacyDocument) -> Result<Descriptor, MigrationFailure> {
  if f.created.is_none() && !f.name.is_empty() && !f.runtime.is_empty() {
    f.created = Some(Utc::now());
  }
  Ok(f)
}

/// `builder` and `builders` used to hold pack builder images. A customized
/// image is carried forward as the `pack` builder image.
fn to_builder_images(mut f: Descriptor, doc: &LegacyDocument) -> Result<Descriptor, MigrationFailure> {
  let builder = doc.decode::<String>("builder")?.filter(|b| looks_like_image(b));
  let named = doc
    .decode::<BTreeMap<String, String>>("builders")?
    .and_then(|builders| builders.get("default").cloned());

  if let Some(image) = builder.or(named)
    && image != LEGACY_DEFAULT_PACK_BUILDER
  {
    debug!(image = %image, "carrying custom builder image forward");
    f.build.builder_images.insert("pack".to_string(), image);
  }
  Ok(f)
}

/// The stamp used to live in `version`. The chain restarts from zero for
/// such files, so only the field name changes.
fn to_spec_version(f: Descriptor, doc: &LegacyDocument) -> Result<Descriptor, MigrationFailure> {
  if let Some(legacy) = doc.scalar("version") {
    debug!(legacy = %legacy, "dropping legacy version field");
  }
  Ok(f)
}

/// Move flat top-level fields into the build, run and deploy groups.
fn to_specs_structure(mut f: Descriptor, doc: &LegacyDocument) -> Result<Descriptor, MigrationFailure> {
  if let Some(git) = doc.decode::<Git>("git")? {
    if !git.url.is_empty() {
      f.build.git.url = git.url;
    }
    if !git.revision.is_empty() {
      f.build.git.revision = git.revision;
    }
    if !git.context_dir.is_empty() {
      f.build.git.context_dir = git.context_dir;
    }
  }
  if let Some(images) = doc.decode::<BTreeMap<String, String>>("builderImages")? {
    f.build.builder_images.extend(images);
  }
  if let Some(buildpacks) = doc.decode::<Vec<String>>("buildpacks")? {
    f.build.buildpacks.extend(buildpacks);
  }
  if let Some(envs) = doc.decode::<Vec<Env>>("buildEnvs")? {
    f.build.build_envs.extend(envs);
  }
  if let Some(volumes) = doc.decode::<Vec<Volume>>("volumes")? {
    f.run.volumes.extend(volumes);
  }
  if let Some(envs) = doc.decode::<Vec<Env>>("envs")? {
    f.run.envs.extend(envs);
  }
  if let Some(annotations) = doc.decode::<BTreeMap<String, String>>("annotations")? {
    f.deploy.annotations.extend(annotations);
  }
  if let Some(options) = doc.decode::<Options>("options")? {
    if options.resources.is_some() {
      f.deploy.options.resources = options.resources;
    }
    if options.scale.is_some() {
      f.deploy.options.scale = options.scale;
    }
  }
  if let Some(labels) = doc.decode::<Vec<Label>>("labels")? {
    f.deploy.labels.extend(labels);
  }
  if let Some(health) = doc.decode::<HealthEndpoints>("healthEndpoints")? {
    if !health.readiness.is_empty() {
      f.deploy.health_endpoints.readiness = health.readiness;
    }
    if !health.liveness.is_empty() {
      f.deploy.health_endpoints.liveness = health.liveness;
    }
  }
  if let Some(namespace) = doc.decode::<String>("namespace")?
    && !namespace.is_empty()
  {
    f.deploy.namespace = namespace;
  }
  if let Some(builder) = doc.decode::<String>("builder")?
    && !builder.is_empty()
    && !looks_like_image(&builder)
  {
    f.build.builder = builder;
  }
  Ok(f)
}

#[derive(Debug, Default, serde::Deserialize)]
struct Invocation {
  #[serde(default)]
  format: String,
}

/// `invocation.format` became the top-level `invoke` hint. `http` is the
/// implied default and is not written.
fn from_invoke_structure(mut f: Descriptor, doc: &LegacyDocument) -> Result<Descriptor, MigrationFailure> {
  if let Some(invocation) = doc.decode::<Invocation>("invocation")?
    && f.invoke.is_empty()
    && invocation.format != "http"
  {
    f.invoke = invocation.format;
  }
  Ok(f)
}
