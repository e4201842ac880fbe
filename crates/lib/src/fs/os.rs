//! Filesystem adapter over a directory on the local disk.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{DirEntry, FileKind, Filesystem, FsError, Metadata, clean};

/// A local directory exposed through [`Filesystem`].
#[derive(Debug, Clone)]
pub struct OsFs {
  root: PathBuf,
}

impl OsFs {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn resolve(&self, path: &str) -> PathBuf {
    let path = clean(path);
    if path == "." {
      return self.root.clone();
    }
    path.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
  }
}

fn kind_of(file_type: fs::FileType) -> FileKind {
  if file_type.is_symlink() {
    FileKind::Symlink
  } else if file_type.is_dir() {
    FileKind::Dir
  } else {
    FileKind::File
  }
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> u32 {
  use std::os::unix::fs::PermissionsExt;
  meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode_of(meta: &fs::Metadata) -> u32 {
  if meta.is_dir() { 0o755 } else { 0o644 }
}

impl Filesystem for OsFs {
  fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FsError> {
    let file = File::open(self.resolve(path)).map_err(|e| FsError::io("open", path, e))?;
    Ok(Box::new(file))
  }

  fn stat(&self, path: &str) -> Result<Metadata, FsError> {
    let meta = fs::symlink_metadata(self.resolve(path)).map_err(|e| FsError::io("stat", path, e))?;
    Ok(Metadata {
      kind: kind_of(meta.file_type()),
      mode: mode_of(&meta),
      len: meta.len(),
    })
  }

  fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
    let dir = fs::read_dir(self.resolve(path)).map_err(|e| FsError::io("readdir", path, e))?;

    let mut entries = Vec::new();
    for entry in dir {
      let entry = entry.map_err(|e| FsError::io("readdir", path, e))?;
      let meta = fs::symlink_metadata(entry.path()).map_err(|e| FsError::io("stat", path, e))?;
      entries.push(DirEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        kind: kind_of(meta.file_type()),
        mode: mode_of(&meta),
      });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
  }

  fn read_link(&self, path: &str) -> Result<String, FsError> {
    let target = fs::read_link(self.resolve(path)).map_err(|e| FsError::io("readlink", path, e))?;
    Ok(target.to_string_lossy().into_owned())
  }
}
