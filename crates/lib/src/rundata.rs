//! The runtime-data directory (`.func`) at a function's root.
//!
//! Holds data which is local to one checkout and never committed:
//!
//! - `built`: fingerprint hash recorded by the last stamp
//! - `built.log`: the entries that produced that hash
//! - `built-image`: image the stamp was recorded for
//! - `local.yaml`: local-only settings

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::RUN_DATA_DIR;
use crate::error::{Error, Result};

pub const BUILD_STAMP_FILE: &str = "built";
pub const BUILD_LOG_FILE: &str = "built.log";
pub const BUILT_IMAGE_FILE: &str = "built-image";
pub const LOCAL_SETTINGS_FILE: &str = "local.yaml";

const GITIGNORE_FILE: &str = ".gitignore";
const GITIGNORE_ENTRY: &str = "/.func";
const GITIGNORE_BLOCK: &str = "
# Functions use the .func directory for local runtime data which should
# generally not be tracked in source control. To instruct the system to track
# .func in source control, comment the following line (prefix it with '# ').
/.func
";

/// Settings that survive reloads but stay out of source control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSettings {
  /// Build and deploy on the cluster rather than locally.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub remote: bool,
}

impl LocalSettings {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  /// Settings stored under `root`. Missing means defaults.
  pub fn load(root: &Path) -> Result<Self> {
    let path = path(root, LOCAL_SETTINGS_FILE);
    let Some(text) = read_optional(&path)? else {
      return Ok(Self::default());
    };
    if text.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(&text).map_err(|e| Error::Malformed(format!("'{}' is not valid: {e}", path.display())))
  }

  /// Persist under `root`. Defaults are only written over an existing file.
  pub fn write(&self, root: &Path) -> Result<()> {
    let path = path(root, LOCAL_SETTINGS_FILE);
    if self.is_empty() && !path.exists() {
      return Ok(());
    }
    ensure(root)?;
    let text = serde_yaml::to_string(self).map_err(|e| Error::Malformed(e.to_string()))?;
    write_atomic(&path, text.as_bytes())
  }
}

/// Path of `name` inside the runtime-data directory of `root`.
pub fn path(root: &Path, name: &str) -> PathBuf {
  root.join(RUN_DATA_DIR).join(name)
}

/// Create the runtime-data directory and make sure git ignores it.
pub fn ensure(root: &Path) -> Result<()> {
  let dir = root.join(RUN_DATA_DIR);
  fs::create_dir_all(&dir).map_err(|e| Error::io("create directory", &dir, e))?;
  ensure_gitignored(root)
}

/// Append the runtime-data directory to `.gitignore` unless some line,
/// commented or not, already names it.
fn ensure_gitignored(root: &Path) -> Result<()> {
  let path = root.join(GITIGNORE_FILE);
  let existing = read_optional(&path)?.unwrap_or_default();

  let listed = existing
    .lines()
    .map(|line| line.trim().trim_start_matches('#').trim())
    .any(|line| line == GITIGNORE_ENTRY);
  if listed {
    return Ok(());
  }

  debug!(path = %path.display(), "adding runtime data directory to .gitignore");
  let mut file = fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .map_err(|e| Error::io("open", &path, e))?;
  file
    .write_all(GITIGNORE_BLOCK.as_bytes())
    .map_err(|e| Error::io("write", &path, e))
}

/// Read a file, mapping "does not exist" to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
  match fs::read_to_string(path) {
    Ok(text) => Ok(Some(text)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(Error::io("read", path, e)),
  }
}

/// Write through a sibling temp file and rename over the target.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
  let mut temp = path.as_os_str().to_owned();
  temp.push(".tmp");
  let temp = PathBuf::from(temp);

  fs::write(&temp, contents).map_err(|e| Error::io("write", &temp, e))?;
  fs::rename(&temp, path).map_err(|e| Error::io("rename", path, e))?;
  info!(path = %path.display(), bytes = contents.len(), "wrote file");
  Ok(())
}
