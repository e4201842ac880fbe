use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{print_success, truncate_hash};

pub fn cmd_stamp(path: &Path) -> Result<()> {
  let mut f = super::load_initialized(path)?;
  f.stamp().context("Failed to record build stamp")?;
  let hash = f.build_stamp.as_deref().unwrap_or_default();
  print_success(&format!("Recorded build stamp {}", truncate_hash(hash)));
  Ok(())
}
