//! The set of template repositories available to a client.
//!
//! The embedded repository always comes first under the name `default`,
//! followed by every repository installed under the repositories path.
//! In single-repository mode a remote locator replaces both and is
//! presented as `default`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::DEFAULT_REPOSITORY_NAME;
use crate::error::{Error, Result};
use crate::repository::Repository;

#[derive(Debug, Clone, Default)]
pub struct Repositories {
  path: Option<PathBuf>,
  remote: Option<String>,
}

impl Repositories {
  /// `path` holds installed repositories, one directory each. `remote`, when
  /// set, enables single-repository mode.
  pub fn new(path: Option<PathBuf>, remote: Option<String>) -> Self {
    Self {
      path,
      remote: remote.filter(|r| !r.is_empty()),
    }
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn is_single(&self) -> bool {
    self.remote.is_some()
  }

  /// Every repository, the default one first.
  pub fn all(&self) -> Result<Vec<Repository>> {
    if let Some(remote) = &self.remote {
      return Ok(vec![Repository::new(Some(DEFAULT_REPOSITORY_NAME), Some(remote))?]);
    }

    let mut repos = vec![Repository::new(None, None)?];
    let Some(path) = &self.path else {
      return Ok(repos);
    };

    let entries = match fs::read_dir(path) {
      Ok(entries) => entries,
      Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
        debug!(path = %path.display(), error = %e, "repositories path not readable");
        return Ok(repos);
      }
      Err(e) => return Err(Error::io("read directory", path, e)),
    };

    let mut dirs = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|e| Error::io("read directory", path, e))?;
      let name = entry.file_name().to_string_lossy().into_owned();
      if name.starts_with('.') || !entry.path().is_dir() {
        continue;
      }
      dirs.push((name, entry.path()));
    }
    dirs.sort();

    for (name, dir) in dirs {
      let locator = dir.to_string_lossy();
      repos.push(Repository::new(Some(&name), Some(&locator))?);
    }
    Ok(repos)
  }

  pub fn list(&self) -> Result<Vec<String>> {
    Ok(self.all()?.into_iter().map(|r| r.name).collect())
  }

  pub fn get(&self, name: &str) -> Result<Repository> {
    let mut all = self.all()?;
    if name == DEFAULT_REPOSITORY_NAME {
      return Ok(all.swap_remove(0));
    }
    if let Some(remote) = &self.remote {
      return Err(Error::SingleRepository {
        remote: remote.clone(),
        name: name.to_string(),
      });
    }
    all
      .into_iter()
      .find(|r| r.name == name)
      .ok_or_else(|| Error::RepositoryNotFound(name.to_string()))
  }

  /// Install the repository at `uri`. Returns the name it was installed
  /// under: `name` if given, otherwise one derived from the repository.
  pub fn add(&self, name: Option<&str>, uri: &str) -> Result<String> {
    let path = self.require_path()?;
    let repo = Repository::new(name, Some(uri))?;

    let dest = path.join(&repo.name);
    if dest.exists() {
      return Err(Error::RepositoryExists(repo.name));
    }
    repo.write(&dest)?;
    info!(repository = %repo.name, uri, path = %dest.display(), "added repository");
    Ok(repo.name)
  }

  pub fn rename(&self, from: &str, to: &str) -> Result<()> {
    let path = self.require_path()?;
    let (src, dest) = (path.join(from), path.join(to));
    if !src.is_dir() {
      return Err(Error::RepositoryNotFound(from.to_string()));
    }
    if dest.exists() {
      return Err(Error::RepositoryExists(to.to_string()));
    }
    fs::rename(&src, &dest).map_err(|e| Error::io("rename", &src, e))?;
    info!(from, to, "renamed repository");
    Ok(())
  }

  pub fn remove(&self, name: &str) -> Result<()> {
    let path = self.require_path()?;
    if name.is_empty() {
      return Err(Error::NameRequired);
    }
    let dir = path.join(name);
    if !dir.is_dir() {
      return Err(Error::RepositoryNotFound(name.to_string()));
    }
    fs::remove_dir_all(&dir).map_err(|e| Error::io("remove", &dir, e))?;
    info!(repository = name, "removed repository");
    Ok(())
  }

  fn require_path(&self) -> Result<&Path> {
    self.path.as_deref().ok_or(Error::RepositoriesPathRequired)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use tempfile::TempDir;

  fn source_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("templates/go/custom");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("handle.go"), "package function\n").unwrap();
    temp
  }

  #[test]
  fn default_repository_comes_first() {
    let repos = Repositories::new(None, None);
    assert_eq!(repos.list().unwrap(), vec!["default"]);
  }

  #[test]
  fn missing_path_yields_only_default() {
    let temp = TempDir::new().unwrap();
    let repos = Repositories::new(Some(temp.path().join("missing")), None);
    assert_eq!(repos.list().unwrap(), vec!["default"]);
  }

  #[test]
  fn add_rename_remove() {
    let source = source_repo();
    let home = TempDir::new().unwrap();
    let repos = Repositories::new(Some(home.path().to_path_buf()), None);
    let uri = source.path().join("templates");

    let name = repos.add(None, uri.to_str().unwrap()).unwrap();
    assert_eq!(name, "templates");
    assert_eq!(repos.list().unwrap(), vec!["default", "templates"]);
    assert!(repos.get("templates").unwrap().template("go", "custom").is_ok());

    let err = repos.add(None, uri.to_str().unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    repos.rename("templates", "mine").unwrap();
    assert_eq!(repos.list().unwrap(), vec!["default", "mine"]);

    repos.remove("mine").unwrap();
    assert_eq!(repos.list().unwrap(), vec!["default"]);
    assert_eq!(repos.remove("mine").unwrap_err().kind(), ErrorKind::RepositoryNotFound);
  }

  #[test]
  fn hidden_directories_are_skipped() {
    let home = TempDir::new().unwrap();
    fs::create_dir(home.path().join(".cache")).unwrap();
    let repos = Repositories::new(Some(home.path().to_path_buf()), None);
    assert_eq!(repos.list().unwrap(), vec!["default"]);
  }

  #[test]
  fn unknown_repository_is_not_found() {
    let repos = Repositories::new(None, None);
    assert_eq!(repos.get("nope").unwrap_err().kind(), ErrorKind::RepositoryNotFound);
  }

  #[test]
  fn mutations_need_a_path() {
    let repos = Repositories::new(None, None);
    assert_eq!(repos.add(None, "/tmp").unwrap_err().kind(), ErrorKind::Required);
    assert_eq!(repos.remove("x").unwrap_err().kind(), ErrorKind::Required);
  }

  #[test]
  fn single_repository_mode_replaces_default() {
    let source = source_repo();
    let uri = source.path().join("templates");
    let repos = Repositories::new(None, Some(uri.to_string_lossy().into_owned()));

    assert!(repos.is_single());
    assert_eq!(repos.list().unwrap(), vec!["default"]);
    assert!(repos.get("default").unwrap().template("go", "custom").is_ok());
    assert_eq!(repos.get("other").unwrap_err().kind(), ErrorKind::RepositoryNotFound);
  }
}
