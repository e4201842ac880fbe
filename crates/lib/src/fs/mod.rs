//! Read-only filesystem abstraction used by the template catalog.
//!
//! Template repositories can come from three places: the archive compiled into
//! this crate, a directory on the local disk, or a fresh shallow clone of a git
//! remote. The catalog and the materializer only ever see the [`Filesystem`]
//! trait, never the concrete adapter.
//!
//! Paths are always relative and slash-separated. `"."` names the root.
//!
//! Adapters:
//! - [`ZipFs`]: the embedded template archive
//! - [`OsFs`]: a local directory (plain or a git working tree)
//! - [`GitFs`]: the working tree of a shallow clone held in a temporary directory
//!
//! [`SubFs`] and [`MaskingFs`] are views layered over any of them.

mod embedded;
mod git;
mod os;

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

pub use embedded::{ZipFs, embedded};
pub use git::{GitError, GitFs, origin_url};
pub use os::OsFs;

/// Errors raised by filesystem adapters.
#[derive(Debug, Error)]
pub enum FsError {
  #[error("{op} {path}: file does not exist")]
  NotFound { op: &'static str, path: String },

  #[error("{op} {path}: {source}")]
  Io {
    op: &'static str,
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("{op} {path}: operation not supported by this filesystem")]
  Unsupported { op: &'static str, path: String },

  #[error("failed to read template archive: {0}")]
  Archive(#[from] zip::result::ZipError),
}

impl FsError {
  /// Wrap an I/O error, folding `NotFound` into the dedicated variant.
  pub(crate) fn io(op: &'static str, path: impl Into<String>, source: io::Error) -> Self {
    let path = path.into();
    if source.kind() == io::ErrorKind::NotFound {
      FsError::NotFound { op, path }
    } else {
      FsError::Io { op, path, source }
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, FsError::NotFound { .. })
  }
}

/// The kind of a filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  File,
  Dir,
  Symlink,
}

/// Metadata returned by [`Filesystem::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
  pub kind: FileKind,
  /// Unix permission bits (`0o777` mask).
  pub mode: u32,
  pub len: u64,
}

impl Metadata {
  pub fn is_dir(&self) -> bool {
    self.kind == FileKind::Dir
  }

  pub fn is_file(&self) -> bool {
    self.kind == FileKind::File
  }
}

/// A single entry returned by [`Filesystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  pub name: String,
  pub kind: FileKind,
  pub mode: u32,
}

impl DirEntry {
  pub fn is_dir(&self) -> bool {
    self.kind == FileKind::Dir
  }
}

/// Read-only capability interface over a tree of files.
pub trait Filesystem: fmt::Debug + Send + Sync {
  /// Open a file for reading.
  fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FsError>;

  /// Describe the node at `path` without following symlinks.
  fn stat(&self, path: &str) -> Result<Metadata, FsError>;

  /// List a directory. Entries are sorted by name.
  fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

  /// Read the target of a symlink.
  fn read_link(&self, path: &str) -> Result<String, FsError> {
    Err(FsError::Unsupported {
      op: "readlink",
      path: path.to_string(),
    })
  }
}

/// Read a whole file into memory.
pub fn read_to_vec(fs: &dyn Filesystem, path: &str) -> Result<Vec<u8>, FsError> {
  let mut reader = fs.open(path)?;
  let mut buf = Vec::new();
  reader
    .read_to_end(&mut buf)
    .map_err(|e| FsError::io("read", path, e))?;
  Ok(buf)
}

/// Normalize a slash-separated relative path: drops empty and `.` segments.
pub fn clean(path: &str) -> String {
  let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
  if parts.is_empty() {
    ".".to_string()
  } else {
    parts.join("/")
  }
}

/// Join two slash-separated relative paths.
pub fn join(base: &str, name: &str) -> String {
  let base = clean(base);
  let name = clean(name);
  match (base.as_str(), name.as_str()) {
    (".", _) => name,
    (_, ".") => base,
    _ => format!("{base}/{name}"),
  }
}

/// Last segment of a slash-separated path.
pub fn base_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

/// Exposes a subdirectory of another filesystem as its root.
#[derive(Debug, Clone)]
pub struct SubFs {
  root: String,
  inner: Arc<dyn Filesystem>,
}

impl SubFs {
  pub fn new(root: &str, inner: Arc<dyn Filesystem>) -> Self {
    Self { root: clean(root), inner }
  }

  /// Path of this view inside the underlying filesystem.
  pub fn root(&self) -> &str {
    &self.root
  }
}

impl Filesystem for SubFs {
  fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FsError> {
    self.inner.open(&join(&self.root, path))
  }

  fn stat(&self, path: &str) -> Result<Metadata, FsError> {
    self.inner.stat(&join(&self.root, path))
  }

  fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
    self.inner.read_dir(&join(&self.root, path))
  }

  fn read_link(&self, path: &str) -> Result<String, FsError> {
    self.inner.read_link(&join(&self.root, path))
  }
}

type MaskFn<'a> = Box<dyn Fn(&str) -> bool + Send + Sync + 'a>;

/// Hides every path for which `masked` returns true.
///
/// Masked nodes report `NotFound` and are dropped from directory listings.
pub struct MaskingFs<'a> {
  masked: MaskFn<'a>,
  inner: &'a dyn Filesystem,
}

impl<'a> MaskingFs<'a> {
  pub fn new(masked: impl Fn(&str) -> bool + Send + Sync + 'a, inner: &'a dyn Filesystem) -> Self {
    Self {
      masked: Box::new(masked),
      inner,
    }
  }

  fn check(&self, op: &'static str, path: &str) -> Result<(), FsError> {
    if (self.masked)(&clean(path)) {
      return Err(FsError::NotFound {
        op,
        path: path.to_string(),
      });
    }
    Ok(())
  }
}

impl fmt::Debug for MaskingFs<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MaskingFs").field("inner", &self.inner).finish_non_exhaustive()
  }
}

impl Filesystem for MaskingFs<'_> {
  fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FsError> {
    self.check("open", path)?;
    self.inner.open(path)
  }

  fn stat(&self, path: &str) -> Result<Metadata, FsError> {
    self.check("stat", path)?;
    self.inner.stat(path)
  }

  fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
    self.check("readdir", path)?;
    let entries = self.inner.read_dir(path)?;
    Ok(
      entries
        .into_iter()
        .filter(|e| !(self.masked)(&join(path, &e.name)))
        .collect(),
    )
  }

  fn read_link(&self, path: &str) -> Result<String, FsError> {
    self.check("readlink", path)?;
    self.inner.read_link(path)
  }
}

/// Copy the tree at `src` in `fs` onto the local disk at `dest`.
///
/// Directories are created as needed, file permission bits are carried over
/// and symlinks are recreated with their original targets.
pub fn copy_from_fs(src: &str, dest: &Path, fs: &dyn Filesystem) -> Result<(), FsError> {
  let src = clean(src);
  let meta = fs.stat(&src)?;
  copy_node(fs, &src, dest, meta.kind, meta.mode)
}

fn copy_node(fs: &dyn Filesystem, path: &str, dest: &Path, kind: FileKind, mode: u32) -> Result<(), FsError> {
  match kind {
    FileKind::Dir => {
      std::fs::create_dir_all(dest).map_err(|e| FsError::io("mkdir", dest.display().to_string(), e))?;
      for entry in fs.read_dir(path)? {
        copy_node(fs, &join(path, &entry.name), &dest.join(&entry.name), entry.kind, entry.mode)?;
      }
      Ok(())
    }
    FileKind::File => {
      trace!(src = path, dest = %dest.display(), "copying file");
      let mut reader = fs.open(path)?;
      let mut out = File::create(dest).map_err(|e| FsError::io("create", dest.display().to_string(), e))?;
      io::copy(&mut reader, &mut out).map_err(|e| FsError::io("write", dest.display().to_string(), e))?;
      set_mode(dest, mode)
    }
    FileKind::Symlink => {
      let target = fs.read_link(path)?;
      symlink(&target, dest)
    }
  }
}

#[cfg(unix)]
fn set_mode(dest: &Path, mode: u32) -> Result<(), FsError> {
  use std::os::unix::fs::PermissionsExt;

  if mode == 0 {
    return Ok(());
  }
  std::fs::set_permissions(dest, std::fs::Permissions::from_mode(mode & 0o777))
    .map_err(|e| FsError::io("chmod", dest.display().to_string(), e))
}

#[cfg(not(unix))]
fn set_mode(_dest: &Path, _mode: u32) -> Result<(), FsError> {
  Ok(())
}

#[cfg(unix)]
fn symlink(target: &str, dest: &Path) -> Result<(), FsError> {
  std::os::unix::fs::symlink(target, dest).map_err(|e| FsError::io("symlink", dest.display().to_string(), e))
}

#[cfg(not(unix))]
fn symlink(_target: &str, dest: &Path) -> Result<(), FsError> {
  Err(FsError::Unsupported {
    op: "symlink",
    path: dest.display().to_string(),
  })
}
