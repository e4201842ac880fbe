use std::path::Path;

use anyhow::{Context, Result};

use fnkit_lib::Descriptor;
use fnkit_lib::migration::LegacyDocument;

use crate::output::{print_info, print_success};

pub fn cmd_migrate(path: &Path) -> Result<()> {
  let on_disk = Descriptor {
    spec_version: LegacyDocument::read(path)
      .with_context(|| format!("Failed to read {}", path.display()))?
      .scalar("specVersion")
      .unwrap_or_default(),
    ..Default::default()
  };

  let f = super::load_initialized(path)?;
  if on_disk.migrated() {
    print_info(&format!("Already at spec version {}", on_disk.spec_version));
    return Ok(());
  }
  f.save().context("Failed to write migrated function")?;
  let before = if on_disk.spec_version.is_empty() { "0" } else { on_disk.spec_version.as_str() };
  print_success(&format!("Migrated from {before} to {}", f.spec_version));
  Ok(())
}
