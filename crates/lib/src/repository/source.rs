//! Turning a repository locator into a filesystem.
//!
//! | locator                         | source                          |
//! |---------------------------------|---------------------------------|
//! | none                            | embedded templates              |
//! | `some/dir`, `/abs/dir`          | local directory                 |
//! | `file:///dir` with a worktree   | local directory                 |
//! | `file:///dir.git` (bare)        | shallow clone                   |
//! | `file:///dir` that fails to clone | local directory               |
//! | `https://host/repo.git#branch`  | shallow clone of `branch`       |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::fs::{self, Filesystem, GitError, GitFs, OsFs};

/// Where a repository's files are read from.
#[derive(Debug, Clone)]
pub(crate) enum Source {
  Embedded,
  Local(PathBuf),
  Cloned(Arc<GitFs>),
}

impl Source {
  /// Local path of the files, if they live on disk.
  pub(crate) fn path(&self) -> Option<&Path> {
    match self {
      Source::Embedded => None,
      Source::Local(path) => Some(path),
      Source::Cloned(git) => Some(git.path()),
    }
  }
}

/// Split an optional `#branch` suffix off a locator.
pub(crate) fn split_branch(locator: &str) -> (&str, Option<&str>) {
  match locator.split_once('#') {
    Some((base, branch)) if !branch.is_empty() => (base, Some(branch)),
    Some((base, _)) => (base, None),
    None => (locator, None),
  }
}

/// Parse a locator as a URL. Scheme-less locators, including Windows drive
/// paths, are plain paths and yield `None`.
fn parse_url(locator: &str) -> Option<Url> {
  Url::parse(locator).ok().filter(|url| url.scheme().len() > 1)
}

/// Open the repository at `locator`.
///
/// An absent or blank locator means the embedded templates. A locator
/// without a scheme is a path on the local disk.
pub(crate) fn open(locator: Option<&str>) -> Result<(Arc<dyn Filesystem>, Source)> {
  let Some(locator) = locator.filter(|l| !l.trim().is_empty()) else {
    return Ok((Arc::new(fs::embedded()?), Source::Embedded));
  };
  let (base, branch) = split_branch(locator);

  let Some(url) = parse_url(base) else {
    return open_local(PathBuf::from(base));
  };
  if url.scheme() != "file" {
    return open_clone(base, branch);
  }

  let path = url.to_file_path().unwrap_or_else(|()| PathBuf::from(&base["file://".len()..]));
  if path.join(".git").is_dir() || !is_bare_repository(&path) {
    return open_local(path);
  }
  match GitFs::clone(base, branch) {
    Ok(git) => {
      let git = Arc::new(git);
      Ok((git.clone(), Source::Cloned(git)))
    }
    Err(e @ GitError::Clone { .. }) => {
      debug!(url = base, error = %e, "no repository found; reading as a directory");
      open_local(path)
    }
    Err(e) => Err(e.into()),
  }
}

fn open_local(path: PathBuf) -> Result<(Arc<dyn Filesystem>, Source)> {
  if !path.exists() {
    return Err(Error::PathNotFound(path));
  }
  let path = dunce::canonicalize(&path).map_err(|e| Error::io("resolve", &path, e))?;
  debug!(path = %path.display(), "reading repository from local directory");
  Ok((Arc::new(OsFs::new(&path)), Source::Local(path)))
}

fn open_clone(url: &str, branch: Option<&str>) -> Result<(Arc<dyn Filesystem>, Source)> {
  let git = Arc::new(GitFs::clone(url, branch)?);
  Ok((git.clone(), Source::Cloned(git)))
}

fn is_bare_repository(path: &Path) -> bool {
  path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}

/// Name implied by a locator: its last path segment without `.git`.
pub(crate) fn name_from_locator(locator: &str) -> Option<String> {
  let (base, _) = split_branch(locator);
  let last = match parse_url(base) {
    Some(url) => url.path_segments()?.filter(|s| !s.is_empty()).next_back()?.to_string(),
    None => Path::new(base).file_name()?.to_string_lossy().into_owned(),
  };
  let name = last.strip_suffix(".git").unwrap_or(&last);
  (!name.is_empty()).then(|| name.to_string())
}
