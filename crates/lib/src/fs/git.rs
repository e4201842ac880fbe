//! Git-backed template sources.
//!
//! Remote repositories are shallow-cloned (single commit, no tags) into a
//! temporary directory that lives exactly as long as the [`GitFs`] holding it.
//! Reads are served from the checked-out working tree.

use std::io::Read;
use std::num::NonZeroU32;
use std::path::Path;

use gix::remote::Direction;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

use super::{DirEntry, Filesystem, FsError, Metadata, OsFs};

/// Errors that can occur while cloning a template repository.
#[derive(Debug, Error)]
pub enum GitError {
  #[error("failed to create temporary checkout directory: {0}")]
  TempDir(#[source] std::io::Error),

  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to clone repository: branch '{branch}' not found for uri {url}")]
  BranchNotFound { url: String, branch: String },

  #[error("failed to checkout repository '{url}': {source}")]
  Checkout {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

/// Working tree of a shallow clone.
///
/// The clone is written to an on-disk temporary directory, not kept in
/// memory. The directory is removed when the last handle is dropped.
#[derive(Debug)]
pub struct GitFs {
  url: String,
  worktree: OsFs,
  _checkout: TempDir,
}

impl GitFs {
  /// Shallow-clone `url`, optionally at `branch`.
  pub fn clone(url: &str, branch: Option<&str>) -> Result<Self, GitError> {
    let checkout = tempfile::Builder::new()
      .prefix("fnkit-repo-")
      .tempdir()
      .map_err(GitError::TempDir)?;
    let dest = checkout.path().join("worktree");

    info!(url, branch = branch.unwrap_or("HEAD"), "cloning template repository");
    clone_shallow(url, branch, &dest)?;
    debug!(url, path = %dest.display(), "clone complete");

    Ok(Self {
      url: url.to_string(),
      worktree: OsFs::new(dest),
      _checkout: checkout,
    })
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Local path of the checked-out working tree, `.git` included.
  pub fn path(&self) -> &Path {
    self.worktree.root()
  }
}

impl Filesystem for GitFs {
  fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FsError> {
    self.worktree.open(path)
  }

  fn stat(&self, path: &str) -> Result<Metadata, FsError> {
    self.worktree.stat(path)
  }

  fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
    self.worktree.read_dir(path)
  }

  fn read_link(&self, path: &str) -> Result<String, FsError> {
    self.worktree.read_link(path)
  }
}

fn clone_shallow(url: &str, branch: Option<&str>, dest: &Path) -> Result<gix::Repository, GitError> {
  let mut prepared = gix::prepare_clone(url, dest)
    .map_err(|e| GitError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?
    .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(NonZeroU32::MIN))
    .configure_remote(|remote| Ok(remote.with_fetch_tags(gix::remote::fetch::Tags::None)));

  if let Some(branch) = branch {
    prepared = prepared.with_ref_name(Some(branch)).map_err(|e| GitError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;
  }

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| {
      let message = e.to_string();
      match branch {
        Some(branch) if is_missing_reference(&message) => GitError::BranchNotFound {
          url: url.to_string(),
          branch: branch.to_string(),
        },
        _ => GitError::Clone {
          url: url.to_string(),
          source: Box::new(e),
        },
      }
    })?;

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| GitError::Checkout {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  Ok(repo)
}

/// Whether a fetch failure reports that the requested reference is absent.
fn is_missing_reference(message: &str) -> bool {
  let message = message.to_lowercase();
  message.contains("ref")
    && ["not found", "wasn't found", "could not be found", "does not have", "no such"]
      .iter()
      .any(|needle| message.contains(needle))
}

/// Origin URL of the git repository at `path`, suffixed with `#branch` when
/// HEAD points at a branch. `None` when `path` is not a git repository or has
/// no fetch remote.
pub fn origin_url(path: &Path) -> Option<String> {
  let repo = gix::open(path).ok()?;
  let remote = repo.find_default_remote(Direction::Fetch)?.ok()?;
  let url = remote.url(Direction::Fetch)?.to_bstring().to_string();
  let branch = repo.head_name().ok().flatten().map(|name| name.shorten().to_string());

  Some(match branch {
    Some(branch) => format!("{url}#{branch}"),
    None => url,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recognizes_missing_reference_messages() {
    assert!(is_missing_reference("The remote reference 'refs/heads/nope' wasn't found"));
    assert!(is_missing_reference("reference not found"));
    assert!(!is_missing_reference("repository not found"));
    assert!(!is_missing_reference("connection refused"));
  }

  #[test]
  fn origin_url_of_plain_directory_is_none() {
    let temp = tempfile::TempDir::new().unwrap();
    assert_eq!(origin_url(temp.path()), None);
  }
}
