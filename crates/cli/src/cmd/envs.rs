use std::path::Path;

use anyhow::{Context, Result};

use fnkit_lib::descriptor::interpolate;

use crate::output::print_info;

/// Print `NAME=VALUE` for every named runtime variable, with local
/// environment references resolved.
pub fn cmd_envs(path: &Path) -> Result<()> {
  let f = super::load_initialized(path)?;

  let (named, whole): (Vec<_>, Vec<_>) = f.run.envs.iter().cloned().partition(|e| e.name.is_some());
  let values = interpolate(&named).context("Failed to resolve environment")?;
  for (name, value) in values {
    println!("{name}={value}");
  }
  for env in whole {
    print_info(&env.to_string());
  }
  Ok(())
}
