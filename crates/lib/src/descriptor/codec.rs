//! Reading and writing `func.yaml`.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;
use tracing::{debug, info};

use super::Descriptor;
use crate::consts::FUNCTION_FILE;
use crate::error::{Error, Result};
use crate::migration::{LEGACY_KEYS, LegacyDocument, latest_version};
use crate::rundata::{self, LocalSettings};

static EXPECTED_FIELDS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r", expected .*?( at line \d+ column \d+)?$").expect("expected-fields pattern is valid")
});

/// Editor hint written above the document. Comments do not round-trip.
const SCHEMA_HEADER: &str = "# $schema: https://raw.githubusercontent.com/knative/func/main/schema/func_yaml-schema.json\n\
# yaml-language-server: $schema=https://raw.githubusercontent.com/knative/func/main/schema/func_yaml-schema.json\n";

impl Descriptor {
  /// Load the function at `root`.
  ///
  /// A directory without `func.yaml` yields an uninitialized descriptor.
  /// Older schemas are migrated in memory; the file is not rewritten.
  pub fn load(root: impl AsRef<Path>) -> Result<Self> {
    let root = root.as_ref();
    let meta = fs::metadata(root).map_err(|e| Error::io("stat", root, e))?;
    if !meta.is_dir() {
      return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let path = root.join(FUNCTION_FILE);
    let Some(text) = rundata::read_optional(&path)? else {
      debug!(path = %root.display(), "no function descriptor found");
      return Ok(Descriptor {
        root: root.to_path_buf(),
        ..Default::default()
      });
    };

    let (decoded, doc) = decode(&text)?;
    let (mut f, structural) = match decoded {
      Ok(f) => (f, None),
      Err(message) => {
        let base = Descriptor {
          spec_version: doc.scalar("specVersion").unwrap_or_default(),
          ..Default::default()
        };
        (base, Some(message))
      }
    };
    f.root = root.to_path_buf();

    let mut f = match (f.migrate_with(&doc), structural) {
      (Ok(f), None) => f,
      (Ok(_), Some(structural)) => return Err(Error::Malformed(structural)),
      (Err(migration), None) => return Err(Error::Migration(migration)),
      (Err(migration), Some(structural)) => return Err(Error::LoadFailed { structural, migration }),
    };

    f.local = LocalSettings::load(root)?;
    f.build_stamp = f.read_build_stamp()?;
    debug!(path = %root.display(), name = %f.name, spec_version = %f.spec_version, "loaded function");
    Ok(f)
  }

  /// Validate and write `func.yaml`, plus local settings.
  ///
  /// The descriptor file is left untouched when its decoded content already
  /// equals this descriptor, so saving alone never makes a build stale.
  pub fn save(&self) -> Result<()> {
    self.validate()?;

    let path = self.root.join(FUNCTION_FILE);
    let current = serde_yaml::to_value(self).map_err(|e| Error::Malformed(e.to_string()))?;

    let unchanged = path.exists()
      && match Descriptor::load(&self.root) {
        Ok(on_disk) => serde_yaml::to_value(&on_disk).is_ok_and(|v| v == current),
        Err(e) => {
          debug!(path = %path.display(), error = %e, "existing descriptor unreadable; overwriting");
          false
        }
      };

    if unchanged {
      debug!(path = %path.display(), "function unchanged; skipping write");
    } else {
      let body = serde_yaml::to_string(self).map_err(|e| Error::Malformed(e.to_string()))?;
      let text = format!("{SCHEMA_HEADER}{body}");
      rundata::write_atomic(&path, text.as_bytes())?;
      info!(path = %path.display(), name = %self.name, "saved function");
    }

    self.local.write(&self.root)
  }
}

/// Decode descriptor text. The outer error is a syntax error; the inner
/// one a structural error which migrations may still need to see.
fn decode(text: &str) -> Result<(std::result::Result<Descriptor, String>, LegacyDocument)> {
  let value: Value = if text.trim().is_empty() {
    Value::Mapping(Default::default())
  } else {
    serde_yaml::from_str(text).map_err(|e| Error::Malformed(format_unmarshal_error(&e)))?
  };
  let value = match value {
    Value::Null => Value::Mapping(Default::default()),
    v @ Value::Mapping(_) => v,
    _ => {
      return Err(Error::Malformed(format!(
        "'{FUNCTION_FILE}' is not valid:\n  document must be a mapping"
      )));
    }
  };
  let doc = LegacyDocument::from_value(&value);

  let probe = Descriptor {
    spec_version: doc.scalar("specVersion").unwrap_or_default(),
    ..Default::default()
  };

  let decoded = if probe.migrated() {
    // Strict decoding of the text keeps line and column in errors.
    if text.trim().is_empty() {
      serde_yaml::from_value(value)
    } else {
      serde_yaml::from_str(text)
    }
  } else {
    debug!(spec_version = %probe.spec_version, latest = latest_version(), "decoding legacy descriptor");
    serde_yaml::from_value(strip_legacy(value))
  };

  Ok((decoded.map_err(|e| format_unmarshal_error(&e)), doc))
}

/// Remove keys only older schemas used, so the strict decoder accepts the
/// rest and migrations can carry their values forward.
fn strip_legacy(value: Value) -> Value {
  let Value::Mapping(mut mapping) = value else {
    return value;
  };
  for key in LEGACY_KEYS {
    mapping.remove(*key);
  }
  // `build` used to be a scalar naming the build type.
  if mapping.get("build").is_some_and(|b| !b.is_mapping() && !b.is_null()) {
    mapping.remove("build");
  }
  Value::Mapping(mapping)
}

fn format_unmarshal_error(err: &serde_yaml::Error) -> String {
  let message = err.to_string();
  let message = EXPECTED_FIELDS.replace(&message, " is not valid${1}");
  format!("'{FUNCTION_FILE}' is not valid:\n  {message}")
}
