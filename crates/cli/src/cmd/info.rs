//! `fnkit info`: metadata and build status of a function.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use crate::output::{OutputFormat, format_age, print_json, print_stat, print_success, print_warning, truncate_hash};

pub fn cmd_info(path: &Path, output: OutputFormat) -> Result<()> {
  let f = super::load_initialized(path)?;

  let image = if f.image.is_empty() {
    f.image_name().ok()
  } else {
    Some(f.image.clone())
  };
  let built = f.built();
  let stamp = f.read_build_stamp()?;

  if output.is_json() {
    let json = serde_json::json!({
      "name": f.name,
      "runtime": f.runtime,
      "specVersion": f.spec_version,
      "registry": f.registry,
      "image": image,
      "created": f.created,
      "invoke": f.invoke,
      "namespace": f.deploy.namespace,
      "remote": f.local.remote,
      "built": built,
      "buildStamp": stamp,
      "builtImage": f.built_image()?,
    });
    return print_json(&json);
  }

  print_success(&format!("Function: {}", f.name));
  print_stat("Runtime", &f.runtime);
  print_stat("Spec version", &f.spec_version);
  if let Some(created) = f.created {
    print_stat("Created", &format_age(created, Utc::now()));
  }
  print_stat("Image", image.as_deref().unwrap_or("(registry not set)"));
  if !f.invoke.is_empty() {
    print_stat("Invoke", &f.invoke);
  }
  if !f.deploy.namespace.is_empty() {
    print_stat("Namespace", &f.deploy.namespace);
  }
  if f.local.remote {
    print_stat("Builds", "remote");
  }
  println!();
  match stamp {
    Some(hash) if built => print_stat("Built", &format!("yes ({})", truncate_hash(&hash))),
    Some(_) => print_warning("Sources or registry changed since the last build"),
    None => print_stat("Built", "never"),
  }
  Ok(())
}
