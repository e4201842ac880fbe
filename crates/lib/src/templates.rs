//! Template lookup across all repositories.

use std::collections::BTreeSet;

use tracing::debug;

use crate::consts::DEFAULT_REPOSITORY_NAME;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::repositories::Repositories;
use crate::repository::Template;

#[derive(Debug, Clone)]
pub struct Templates {
  repositories: Repositories,
}

impl Templates {
  pub fn new(repositories: Repositories) -> Self {
    Self { repositories }
  }

  pub fn repositories(&self) -> &Repositories {
    &self.repositories
  }

  /// Templates for `runtime`: the default repository's by short name, then
  /// every other repository's by full name, sorted.
  pub fn list(&self, runtime: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut extended = BTreeSet::new();
    for repo in self.repositories.all()? {
      for t in repo.templates(runtime) {
        if repo.name == DEFAULT_REPOSITORY_NAME {
          names.push(t.name().to_string());
        } else {
          extended.insert(t.fullname());
        }
      }
    }
    names.extend(extended);
    Ok(names)
  }

  /// Look up `repository/name`. A bare name refers to the default repository.
  pub fn get(&self, runtime: &str, fullname: &str) -> Result<Template> {
    let (repo, name) = split_fullname(fullname);
    debug!(repository = repo, runtime, template = name, "looking up template");
    let repo = self.repositories.get(repo)?;
    Ok(repo.template(runtime, name)?.clone())
  }

  /// Validate `f`, then materialize its template into its root.
  pub fn write(&self, f: &mut Descriptor) -> Result<()> {
    f.validate()?;
    let template = self.get(&f.runtime, &f.template)?;
    template.write(f)
  }
}

fn split_fullname(fullname: &str) -> (&str, &str) {
  match fullname.split_once('/') {
    Some((repo, name)) => (repo, name.split('/').next().unwrap_or(name)),
    None => (DEFAULT_REPOSITORY_NAME, fullname),
  }
}
