//! Build staleness detection.
//!
//! A fingerprint hashes the relative path and modification time of every
//! entry in a function's tree. [`Descriptor::stamp`] records it after a
//! build and [`Descriptor::built`] compares it against a fresh one.
//!
//! The runtime-data and `.git` directories are skipped entirely. Staleness
//! is advisory: the tree may change between a fingerprint and its use.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::RUN_DATA_DIR;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::rundata::{self, BUILD_LOG_FILE, BUILD_STAMP_FILE, BUILT_IMAGE_FILE};

const GIT_DIR: &str = ".git";

#[derive(Debug, Error)]
pub enum FingerprintError {
  #[error("failed to walk {path}: {message}")]
  Walk { path: String, message: String },

  #[error("failed to read metadata of {path}: {source}")]
  Metadata {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("fingerprint was cancelled")]
  Cancelled,
}

/// A tree fingerprint: hex sha256 plus one log line per hashed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
  pub hash: String,
  pub log: String,
}

/// Fingerprint the tree at `root`.
pub fn fingerprint(root: &Path) -> Result<Fingerprint, FingerprintError> {
  fingerprint_with_cancel(root, None)
}

/// Fingerprint the tree at `root`, stopping early once `cancel` is set.
///
/// Entries are visited in file-name order so an unchanged tree always
/// yields the same hash.
pub fn fingerprint_with_cancel(root: &Path, cancel: Option<&AtomicBool>) -> Result<Fingerprint, FingerprintError> {
  let mut hasher = Sha256::new();
  let mut log = String::new();

  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
    !(e.depth() > 0 && e.file_type().is_dir() && (e.file_name() == RUN_DATA_DIR || e.file_name() == GIT_DIR))
  });

  for entry in walker {
    if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
      return Err(FingerprintError::Cancelled);
    }
    let entry = entry.map_err(|e| FingerprintError::Walk {
      path: root.display().to_string(),
      message: e.to_string(),
    })?;
    if entry.depth() == 0 {
      continue;
    }

    let rel_path = entry
      .path()
      .strip_prefix(root)
      .unwrap_or(entry.path())
      .to_string_lossy()
      .replace('\\', "/");
    let metadata = entry.path().symlink_metadata().map_err(|source| FingerprintError::Metadata {
      path: entry.path().display().to_string(),
      source,
    })?;
    let mtime = metadata
      .modified()
      .ok()
      .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
      .map(|d| d.as_nanos())
      .unwrap_or(0);

    hasher.update(format!("{rel_path}:{mtime}:").as_bytes());
    log.push_str(&format!("{rel_path} {mtime}\n"));
  }

  Ok(Fingerprint {
    hash: hex::encode(hasher.finalize()),
    log,
  })
}

impl Descriptor {
  /// Record the current fingerprint as the last build, along with the
  /// image that build produced.
  pub fn stamp(&mut self) -> Result<()> {
    rundata::ensure(&self.root)?;
    let fp = fingerprint(&self.root)?;

    let image = if self.image.is_empty() {
      self.image_name().unwrap_or_default()
    } else {
      self.image.clone()
    };

    rundata::write_atomic(&rundata::path(&self.root, BUILD_STAMP_FILE), fp.hash.as_bytes())?;
    rundata::write_atomic(&rundata::path(&self.root, BUILD_LOG_FILE), fp.log.as_bytes())?;
    rundata::write_atomic(&rundata::path(&self.root, BUILT_IMAGE_FILE), image.as_bytes())?;

    info!(path = %self.root.display(), hash = %fp.hash, image = %image, "recorded build stamp");
    self.build_stamp = Some(fp.hash);
    Ok(())
  }

  /// Hash recorded by the last [`Self::stamp`]. `None` if never built.
  pub fn read_build_stamp(&self) -> Result<Option<String>> {
    let stamp = rundata::read_optional(&rundata::path(&self.root, BUILD_STAMP_FILE))?;
    Ok(stamp.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
  }

  /// Image recorded by the last [`Self::stamp`].
  pub fn built_image(&self) -> Result<Option<String>> {
    let image = rundata::read_optional(&rundata::path(&self.root, BUILT_IMAGE_FILE))?;
    Ok(image.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
  }

  /// Whether the last build is still current.
  ///
  /// True only when a stamp exists, the tree fingerprint still matches it,
  /// and the built image is still the one this descriptor resolves to. An
  /// explicit `image` is trusted as is, so a registry change goes unnoticed
  /// while one is set.
  pub fn built(&self) -> bool {
    let stamp = match self.read_build_stamp() {
      Ok(Some(stamp)) => stamp,
      Ok(None) => {
        debug!(path = %self.root.display(), "no build stamp");
        return false;
      }
      Err(e) => {
        warn!(path = %self.root.display(), error = %e, "unable to read build stamp");
        return false;
      }
    };

    let current = match fingerprint(&self.root) {
      Ok(fp) => fp.hash,
      Err(e) => {
        warn!(path = %self.root.display(), error = %e, "error calculating function's fingerprint");
        return false;
      }
    };
    if current != stamp {
      debug!(path = %self.root.display(), "fingerprint changed since last build");
      return false;
    }

    if !self.image.is_empty() {
      return true;
    }
    let Ok(expected) = self.image_name() else {
      return false;
    };
    match self.built_image() {
      Ok(Some(built)) if built == expected => true,
      Ok(built) => {
        debug!(expected = %expected, built = ?built, "built image does not match configured registry");
        false
      }
      Err(e) => {
        warn!(path = %self.root.display(), error = %e, "unable to read built image");
        false
      }
    }
  }
}
