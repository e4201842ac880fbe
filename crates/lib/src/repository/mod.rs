//! Template repositories.
//!
//! A repository is a tree of runtimes, each holding templates:
//!
//! ```text
//! manifest.yaml            optional, may move the tree via `templates:`
//! go/
//!   manifest.yaml          optional
//!   http/                  a template
//!   cloudevents/
//!   scaffolding/           reserved, never a template
//! certs/                   reserved, never a runtime
//! ```
//!
//! The catalog is built from scratch on every [`Repository::new`]; nothing
//! is cached between calls.

mod source;
mod template;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

pub use template::Template;

use crate::consts::{DEFAULT_REPOSITORY_NAME, RESERVED_CERTS_DIR, RESERVED_SCAFFOLDING_DIR};
use crate::error::{Error, Result};
use crate::fs::{self, DirEntry, Filesystem, SubFs, origin_url};
use crate::manifest::{ManifestConfig, ManifestError, RepositoryManifest};
use source::Source;

/// A runtime and the templates written for it.
#[derive(Debug, Clone)]
pub struct Runtime {
  pub name: String,
  pub templates: Vec<Template>,
  config: ManifestConfig,
}

impl Runtime {
  /// Defaults resolved through the repository and runtime manifests.
  pub fn config(&self) -> &ManifestConfig {
    &self.config
  }
}

/// A loaded template repository.
#[derive(Debug, Clone)]
pub struct Repository {
  pub name: String,
  /// Version declared by the repository manifest.
  pub version: Option<String>,
  pub runtimes: Vec<Runtime>,
  config: ManifestConfig,
  templates_path: String,
  fs: Arc<dyn Filesystem>,
  source: Source,
}

impl Repository {
  /// Load the repository found at `locator`, or the embedded one when
  /// `locator` is `None`.
  ///
  /// The name is, in order of precedence: `name`, the name declared by the
  /// repository manifest, the last segment of `locator`, or `default`.
  pub fn new(name: Option<&str>, locator: Option<&str>) -> Result<Self> {
    let (fs, source) = source::open(locator)?;
    let manifest = RepositoryManifest::load(fs.as_ref())?;

    let name = name
      .filter(|n| !n.is_empty())
      .map(str::to_string)
      .or_else(|| manifest.name.clone().filter(|n| !n.is_empty()))
      .or_else(|| locator.and_then(source::name_from_locator))
      .unwrap_or_else(|| DEFAULT_REPOSITORY_NAME.to_string());

    let templates_path = manifest.templates_path();
    let runtimes = discover_runtimes(&fs, &name, &templates_path, &manifest.config)?;
    info!(
      repository = %name,
      locator = locator.unwrap_or("embedded"),
      runtimes = runtimes.len(),
      "loaded repository"
    );

    Ok(Self {
      name,
      version: manifest.version,
      runtimes,
      config: manifest.config,
      templates_path,
      fs,
      source,
    })
  }

  /// Defaults declared by the repository manifest.
  pub fn config(&self) -> &ManifestConfig {
    &self.config
  }

  /// Directory holding the runtimes, relative to the repository root.
  pub fn templates_path(&self) -> &str {
    &self.templates_path
  }

  pub fn fs(&self) -> &dyn Filesystem {
    self.fs.as_ref()
  }

  /// Templates for `runtime`. Empty when the runtime is unknown.
  pub fn templates(&self, runtime: &str) -> &[Template] {
    self
      .runtimes
      .iter()
      .find(|r| r.name == runtime)
      .map(|r| r.templates.as_slice())
      .unwrap_or_default()
  }

  pub fn runtime(&self, name: &str) -> Result<&Runtime> {
    if name.is_empty() {
      return Err(Error::RuntimeRequired);
    }
    self
      .runtimes
      .iter()
      .find(|r| r.name == name)
      .ok_or_else(|| Error::RuntimeNotFound(name.to_string()))
  }

  pub fn template(&self, runtime: &str, name: &str) -> Result<&Template> {
    self
      .runtime(runtime)?
      .templates
      .iter()
      .find(|t| t.name == name)
      .ok_or_else(|| Error::TemplateNotFound {
        runtime: runtime.to_string(),
        template: name.to_string(),
      })
  }

  /// Copy the entire repository, git metadata included, to `dest`.
  pub fn write(&self, dest: &Path) -> Result<()> {
    info!(repository = %self.name, path = %dest.display(), "writing repository");
    fs::copy_from_fs(".", dest, self.fs.as_ref())?;
    Ok(())
  }

  /// Origin URL of a git-backed repository, with `#branch` when HEAD is on
  /// a branch. `None` for the embedded repository and plain directories.
  pub fn url(&self) -> Option<String> {
    self.source.path().and_then(origin_url)
  }
}

/// Directories of `dir` that are not hidden and not `reserved`.
fn visible_dirs(fs: &dyn Filesystem, dir: &str, reserved: &str) -> Result<Vec<DirEntry>> {
  let entries = fs.read_dir(dir)?;
  Ok(
    entries
      .into_iter()
      .filter(|e| e.is_dir() && !e.name.starts_with('.') && e.name != reserved)
      .collect(),
  )
}

fn discover_runtimes(
  shared: &Arc<dyn Filesystem>,
  repository: &str,
  templates_path: &str,
  repo_cfg: &ManifestConfig,
) -> Result<Vec<Runtime>> {
  let fs = shared.as_ref();
  let missing = || ManifestError::TemplatesPath {
    path: templates_path.to_string(),
  };
  match fs.stat(templates_path) {
    Ok(meta) if meta.is_dir() => {}
    Ok(_) => return Err(missing().into()),
    Err(e) if e.is_not_found() => return Err(missing().into()),
    Err(e) => return Err(e.into()),
  }

  let mut runtimes = Vec::new();
  for entry in visible_dirs(fs, templates_path, RESERVED_CERTS_DIR)? {
    let runtime_dir = fs::join(templates_path, &entry.name);
    let config = repo_cfg.inherit(fs, &runtime_dir)?;

    let mut templates = Vec::new();
    for t in visible_dirs(fs, &runtime_dir, RESERVED_SCAFFOLDING_DIR)? {
      let template_dir = fs::join(&runtime_dir, &t.name);
      templates.push(Template {
        config: config.inherit(fs, &template_dir)?,
        name: t.name,
        runtime: entry.name.clone(),
        repository: repository.to_string(),
        fs: SubFs::new(&template_dir, shared.clone()),
      });
    }
    debug!(repository, runtime = %entry.name, templates = templates.len(), "discovered runtime");

    runtimes.push(Runtime {
      name: entry.name,
      templates,
      config,
    });
  }
  Ok(runtimes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use tempfile::TempDir;

  fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
  }

  fn sample() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "manifest.yaml", "buildpacks:\n  - repoBuildpack\n");
    write(root, "R/manifest.yaml", "invoke: cloudevent\n");
    write(root, "R/tpl/handle.go", "package function\n");
    write(root, "R/scaffolding/main.go", "package main\n");
    write(root, "R/.hidden/x", "x");
    write(root, "R2/manifest.yaml", "buildpacks:\n  - runtimeBuildpack\n");
    write(root, "R2/tpl/index.js", "module.exports = {}\n");
    write(root, "certs/ca.pem", "pem");
    write(root, ".github/workflows/ci.yaml", "on: push\n");
    write(root, "README.md", "readme");
    temp
  }

  fn load(temp: &TempDir) -> Repository {
    Repository::new(None, Some(temp.path().to_str().unwrap())).unwrap()
  }

  #[test]
  fn discovers_runtimes_and_templates() {
    let temp = sample();
    let repo = load(&temp);

    let runtimes: Vec<_> = repo.runtimes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(runtimes, vec!["R", "R2"]);
    let templates: Vec<_> = repo.templates("R").iter().map(|t| t.name()).collect();
    assert_eq!(templates, vec!["tpl"]);
    assert!(repo.templates("missing").is_empty());
  }

  #[test]
  fn templates_inherit_through_the_cascade() {
    let temp = sample();
    let repo = load(&temp);

    let inherited = repo.template("R", "tpl").unwrap();
    assert_eq!(inherited.config().buildpacks, Some(vec!["repoBuildpack".to_string()]));
    assert_eq!(inherited.config().invoke.as_deref(), Some("cloudevent"));

    let overridden = repo.template("R2", "tpl").unwrap();
    assert_eq!(overridden.config().buildpacks, Some(vec!["runtimeBuildpack".to_string()]));
  }

  #[test]
  fn lookups_report_distinct_kinds() {
    let temp = sample();
    let repo = load(&temp);

    assert_eq!(repo.runtime("").unwrap_err().kind(), ErrorKind::Required);
    assert_eq!(repo.runtime("rust").unwrap_err().kind(), ErrorKind::RuntimeNotFound);
    assert_eq!(repo.template("R", "nope").unwrap_err().kind(), ErrorKind::TemplateNotFound);
  }

  #[test]
  fn name_precedence() {
    let temp = sample();
    let locator = temp.path().join("named");
    std::fs::create_dir(&locator).unwrap();
    let locator = locator.to_str().unwrap();

    assert_eq!(Repository::new(None, Some(locator)).unwrap().name, "named");
    write(&temp.path().join("named"), "manifest.yaml", "name: declared\n");
    assert_eq!(Repository::new(None, Some(locator)).unwrap().name, "declared");
    assert_eq!(Repository::new(Some("explicit"), Some(locator)).unwrap().name, "explicit");
  }

  #[test]
  fn templates_path_relocates_runtimes() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "manifest.yaml", "templates: src\n");
    write(temp.path(), "src/go/http/handle.go", "package function\n");
    write(temp.path(), "docs/index.md", "docs");

    let repo = load(&temp);
    assert_eq!(repo.templates_path(), "src");
    assert_eq!(repo.runtimes.len(), 1);
    assert!(repo.template("go", "http").unwrap().fs().stat("handle.go").is_ok());
  }

  #[test]
  fn missing_templates_path_is_an_error() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "manifest.yaml", "templates: nowhere\n");
    let err = Repository::new(None, Some(temp.path().to_str().unwrap())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
  }

  #[test]
  fn write_copies_whole_tree() {
    let temp = sample();
    let repo = load(&temp);
    let dest = TempDir::new().unwrap();
    let target = dest.path().join("copy");

    repo.write(&target).unwrap();
    assert!(target.join("manifest.yaml").is_file());
    assert!(target.join("R/scaffolding/main.go").is_file());
    assert!(target.join(".github/workflows/ci.yaml").is_file());
  }

  #[test]
  fn plain_directory_has_no_url() {
    let temp = sample();
    assert_eq!(load(&temp).url(), None);
  }

  #[test]
  fn embedded_repository_is_default() {
    let repo = Repository::new(None, None).unwrap();
    assert_eq!(repo.name, DEFAULT_REPOSITORY_NAME);
    assert!(repo.template("go", "http").is_ok());
    assert!(repo.template("go", "scaffolding").is_err());
    assert_eq!(repo.url(), None);
  }
}
