//! Create a new function from a template.
//!
//! [`init`] scaffolds a function root with:
//! - the chosen template's files
//! - `func.yaml` with the template's defaults applied
//! - the `.func` runtime-data directory, ignored by git
//! - an initial `.funcignore`

mod templates;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::consts::{FUNC_IGNORE_FILE, FUNCTION_FILE};
use crate::descriptor::Descriptor;
use crate::descriptor::validate::validate_function_name;
use crate::error::{Error, Result};
use crate::rundata;
use crate::templates::Templates;

pub use templates::FUNCIGNORE;

/// Files which, if present, mean the directory may already hold a function.
const CONTENTIOUS_FILES: [&str; 2] = [FUNCTION_FILE, ".gitignore"];

/// Options for creating a function.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
  /// Directory to create the function in. Created if missing.
  pub root: PathBuf,
  /// Defaults to the name of `root`.
  pub name: Option<String>,
  pub runtime: String,
  /// Template name, optionally prefixed with a repository (`repo/name`).
  /// Defaults to `http`.
  pub template: Option<String>,
  pub registry: Option<String>,
  pub namespace: Option<String>,
  pub builder: Option<String>,
}

/// Create a function at `options.root` and return it freshly loaded.
///
/// # Errors
///
/// Returns an error if:
/// - the root already holds an initialized function
/// - the root contains contentious or visible files
/// - the name is not a valid DNS-1035 label
/// - the runtime or template cannot be found
pub fn init(options: &InitOptions, templates: &Templates) -> Result<Descriptor> {
  fs::create_dir_all(&options.root).map_err(|e| Error::io("create directory", &options.root, e))?;
  let root = dunce::canonicalize(&options.root).map_err(|e| Error::io("resolve", &options.root, e))?;

  if Descriptor::load(&root)?.initialized() {
    return Err(Error::AlreadyInitialized(root));
  }

  let name = match options.name.as_deref().filter(|n| !n.is_empty()) {
    Some(name) => name.to_string(),
    None => name_from_path(&root),
  };
  assert_empty_root(&root)?;
  validate_function_name(&name).map_err(|source| Error::InvalidName {
    name: name.clone(),
    source,
  })?;

  let mut f = Descriptor::new_with(Descriptor {
    root: root.clone(),
    name,
    runtime: options.runtime.clone(),
    template: options.template.clone().unwrap_or_default(),
    registry: options.registry.clone().unwrap_or_default(),
    ..Default::default()
  });
  if let Some(namespace) = &options.namespace {
    f.deploy.namespace = namespace.clone();
  }
  if let Some(builder) = &options.builder {
    f.build.builder = builder.clone();
  }

  rundata::ensure(&root)?;
  write_funcignore(&root)?;
  templates.write(&mut f)?;
  // A template may ship its own .gitignore.
  rundata::ensure(&root)?;

  f.created = Some(Utc::now());
  f.save()?;
  info!(
    name = %f.name,
    runtime = %f.runtime,
    template = %f.template,
    path = %root.display(),
    "created function"
  );

  Descriptor::load(&root)
}

fn name_from_path(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn assert_empty_root(root: &Path) -> Result<()> {
  let mut contentious = Vec::new();
  let mut visible = false;
  for entry in fs::read_dir(root).map_err(|e| Error::io("read directory", root, e))? {
    let entry = entry.map_err(|e| Error::io("read directory", root, e))?;
    let name = entry.file_name().to_string_lossy().into_owned();
    if CONTENTIOUS_FILES.contains(&name.as_str()) {
      contentious.push(name);
    } else if !name.starts_with('.') {
      visible = true;
    }
  }

  if !contentious.is_empty() {
    contentious.sort();
    return Err(Error::ContentiousFiles {
      path: root.to_path_buf(),
      files: contentious,
    });
  }
  if visible {
    return Err(Error::NotEmpty(root.to_path_buf()));
  }
  Ok(())
}

fn write_funcignore(root: &Path) -> Result<()> {
  let path = root.join(FUNC_IGNORE_FILE);
  match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
    Ok(mut file) => file
      .write_all(FUNCIGNORE.as_bytes())
      .map_err(|e| Error::io("write", &path, e)),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
      debug!(path = %path.display(), "keeping existing .funcignore");
      Ok(())
    }
    Err(e) => Err(Error::io("create", &path, e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use crate::repositories::Repositories;
  use tempfile::TempDir;

  fn templates() -> Templates {
    Templates::new(Repositories::new(None, None))
  }

  fn options(root: PathBuf) -> InitOptions {
    InitOptions {
      root,
      runtime: "go".into(),
      registry: Some("alice".into()),
      ..Default::default()
    }
  }

  #[test]
  fn init_creates_function() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("my-fn");

    let f = init(&options(root.clone()), &templates()).unwrap();

    assert!(f.initialized());
    assert_eq!(f.name, "my-fn");
    assert_eq!(f.runtime, "go");
    assert_eq!(f.registry, "alice");
    assert!(root.join("func.yaml").is_file());
    assert!(root.join(".funcignore").is_file());
    assert!(root.join(".func").is_dir());
    assert!(!root.join("manifest.yaml").exists());
    let gitignore = fs::read_to_string(root.join(".gitignore")).unwrap();
    assert!(gitignore.contains("/.func"));
  }

  #[test]
  fn init_applies_template_defaults() {
    let temp = TempDir::new().unwrap();
    let f = init(&options(temp.path().join("fn")), &templates()).unwrap();
    assert_eq!(f.deploy.health_endpoints.liveness, "/health/liveness");
    assert_eq!(f.deploy.health_endpoints.readiness, "/health/readiness");
  }

  #[test]
  fn init_refuses_existing_function() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("fn");
    init(&options(root.clone()), &templates()).unwrap();

    let err = init(&options(root), &templates()).unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized(_)));
  }

  #[test]
  fn init_refuses_contentious_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".gitignore"), "target/\n").unwrap();
    let root = temp.path().to_path_buf();
    let err = init(&options(root), &templates()).unwrap_err();
    assert!(matches!(err, Error::ContentiousFiles { ref files, .. } if files == &[".gitignore"]));
  }

  #[test]
  fn init_refuses_visible_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("fn");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("main.go"), "package main\n").unwrap();
    fs::write(root.join(".env"), "X=1\n").unwrap();

    let err = init(&options(root), &templates()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
  }

  #[test]
  fn init_rejects_invalid_names() {
    let temp = TempDir::new().unwrap();
    let err = init(&options(temp.path().join("My_Fn")), &templates()).unwrap_err();
    assert!(matches!(err, Error::InvalidName { .. }));
  }

  #[test]
  fn init_reports_unknown_runtime() {
    let temp = TempDir::new().unwrap();
    let mut opts = options(temp.path().join("fn"));
    opts.runtime = "cobol".into();
    assert_eq!(init(&opts, &templates()).unwrap_err().kind(), ErrorKind::RuntimeNotFound);
  }

  #[test]
  fn existing_funcignore_is_kept() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".funcignore"), "custom\n").unwrap();
    write_funcignore(temp.path()).unwrap();
    assert_eq!(fs::read_to_string(temp.path().join(".funcignore")).unwrap(), "custom\n");
  }
}
