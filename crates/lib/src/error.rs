//! Crate-level error type.
//!
//! Component errors are wrapped here so callers can match on [`ErrorKind`]
//! across module boundaries without inspecting payloads.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;
use crate::descriptor::EnvError;
use crate::descriptor::validate::{NameError, ValidationErrors};
use crate::fingerprint::FingerprintError;
use crate::fs::{FsError, GitError};
use crate::manifest::ManifestError;
use crate::migration::MigrationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("function path must be a directory: {}", .0.display())]
  NotADirectory(PathBuf),

  /// The descriptor text does not decode.
  #[error("{0}")]
  Malformed(String),

  #[error(transparent)]
  Migration(#[from] MigrationError),

  /// Both decoding and migration failed during a load.
  #[error("Error: \nMarshalling: {structural}\nMigration: {migration}")]
  LoadFailed {
    structural: String,
    migration: MigrationError,
  },

  #[error(transparent)]
  Validation(#[from] ValidationErrors),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("repository not found: {0}")]
  RepositoryNotFound(String),

  #[error("runtime not found: {0}")]
  RuntimeNotFound(String),

  #[error("template not found: {runtime}/{template}")]
  TemplateNotFound { runtime: String, template: String },

  #[error("path does not exist: {}", .0.display())]
  PathNotFound(PathBuf),

  #[error("runtime is required")]
  RuntimeRequired,

  #[error("function name is required")]
  NameRequired,

  #[error("function registry is required")]
  RegistryRequired,

  #[error("function root path is required")]
  RootRequired,

  #[error("registry '{0}' has more than three parts")]
  InvalidRegistry(String),

  #[error("invalid function name '{name}': {source}")]
  InvalidName {
    name: String,
    #[source]
    source: NameError,
  },

  #[error("function at '{}' is already initialized", .0.display())]
  AlreadyInitialized(PathBuf),

  #[error("'{}' does not contain an initialized function", .0.display())]
  NotInitialized(PathBuf),

  #[error("the chosen directory '{}' contains contentious files: {}; use a different directory or remove them", path.display(), files.join(", "))]
  ContentiousFiles { path: PathBuf, files: Vec<String> },

  #[error("the chosen directory '{}' must be empty of visible files", .0.display())]
  NotEmpty(PathBuf),

  #[error("repository '{0}' already exists")]
  RepositoryExists(String),

  #[error("repositories path not defined")]
  RepositoriesPathRequired,

  #[error("only the repository '{remote}' is available; '{name}' is not loaded")]
  SingleRepository { remote: String, name: String },

  #[error(transparent)]
  Env(#[from] EnvError),

  #[error(transparent)]
  Fingerprint(#[from] FingerprintError),

  #[error(transparent)]
  Fs(#[from] FsError),

  #[error(transparent)]
  Git(#[from] GitError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("failed to {op} {}: {source}", path.display())]
  Io {
    op: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  NotADirectory,
  Structural,
  Migration,
  Validation,
  RepositoryNotFound,
  RuntimeNotFound,
  TemplateNotFound,
  BranchNotFound,
  PathNotFound,
  EnvNotFound,
  Required,
  StalenessIndeterminate,
  Conflict,
  Clone,
  Config,
  Io,
}

impl Error {
  pub(crate) fn io(op: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
    Error::Io {
      op,
      path: path.as_ref().to_path_buf(),
      source,
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::NotADirectory(_) => ErrorKind::NotADirectory,
      Error::Malformed(_) | Error::Manifest(_) | Error::LoadFailed { .. } => ErrorKind::Structural,
      Error::Migration(_) => ErrorKind::Migration,
      Error::Validation(_) | Error::InvalidRegistry(_) | Error::InvalidName { .. } => ErrorKind::Validation,
      Error::RepositoryNotFound(_) | Error::SingleRepository { .. } => ErrorKind::RepositoryNotFound,
      Error::RuntimeNotFound(_) => ErrorKind::RuntimeNotFound,
      Error::TemplateNotFound { .. } => ErrorKind::TemplateNotFound,
      Error::PathNotFound(_) => ErrorKind::PathNotFound,
      Error::RuntimeRequired
      | Error::NameRequired
      | Error::RegistryRequired
      | Error::RootRequired
      | Error::RepositoriesPathRequired => ErrorKind::Required,
      Error::AlreadyInitialized(_)
      | Error::NotInitialized(_)
      | Error::ContentiousFiles { .. }
      | Error::NotEmpty(_)
      | Error::RepositoryExists(_) => ErrorKind::Conflict,
      Error::Env(EnvError::NotFound(_)) => ErrorKind::EnvNotFound,
      Error::Env(EnvError::NameRequired) => ErrorKind::Validation,
      Error::Fingerprint(_) => ErrorKind::StalenessIndeterminate,
      Error::Git(GitError::BranchNotFound { .. }) => ErrorKind::BranchNotFound,
      Error::Git(_) => ErrorKind::Clone,
      Error::Config(_) => ErrorKind::Config,
      Error::Fs(e) if e.is_not_found() => ErrorKind::PathNotFound,
      Error::Fs(_) | Error::Io { .. } => ErrorKind::Io,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_distinguish_not_found_conditions() {
    assert_eq!(Error::RepositoryNotFound("x".into()).kind(), ErrorKind::RepositoryNotFound);
    assert_eq!(Error::RuntimeNotFound("go".into()).kind(), ErrorKind::RuntimeNotFound);
    assert_eq!(
      Error::TemplateNotFound {
        runtime: "go".into(),
        template: "nope".into()
      }
      .kind(),
      ErrorKind::TemplateNotFound
    );
    assert_eq!(Error::RegistryRequired.kind(), ErrorKind::Required);
    assert_eq!(Error::from(EnvError::NotFound("FOO".into())).kind(), ErrorKind::EnvNotFound);
  }

  #[test]
  fn io_errors_carry_operation_and_path() {
    let err = Error::io("read", "/tmp/x", io::Error::other("boom"));
    assert_eq!(err.to_string(), "failed to read /tmp/x: boom");
    assert_eq!(err.kind(), ErrorKind::Io);
  }
}
