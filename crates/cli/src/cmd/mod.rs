mod config;
mod create;
mod envs;
mod info;
mod migrate;
mod repository;
mod stamp;
mod templates;

use std::path::Path;

use anyhow::{Context, Result, bail};
use fnkit_lib::Descriptor;
use fnkit_lib::repositories::Repositories;
use fnkit_lib::templates::Templates;

pub use config::{ConfigCommand, cmd_config};
pub use create::cmd_create;
pub use envs::cmd_envs;
pub use info::cmd_info;
pub use migrate::cmd_migrate;
pub use repository::{RepositoryCommand, cmd_repository};
pub use stamp::cmd_stamp;
pub use templates::cmd_templates;

/// Repositories from the global config, or only `remote` when given.
fn repositories(remote: Option<String>) -> Repositories {
  Repositories::new(fnkit_lib::config::repositories_path(), remote)
}

fn templates(remote: Option<String>) -> Templates {
  Templates::new(repositories(remote))
}

/// Load the function at `path`, failing if none was created there.
fn load_initialized(path: &Path) -> Result<Descriptor> {
  let f = Descriptor::load(path).with_context(|| format!("Failed to load function at {}", path.display()))?;
  if !f.initialized() {
    bail!(fnkit_lib::Error::NotInitialized(path.to_path_buf()));
  }
  Ok(f)
}
