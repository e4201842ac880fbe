//! Implementation of the `fnkit create` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};

use fnkit_lib::config::Global;
use fnkit_lib::consts::DEFAULT_TEMPLATE;
use fnkit_lib::init::{InitOptions, init};

use crate::output::{print_stat, symbols};

pub fn cmd_create(
  path: &Path,
  language: Option<String>,
  template: Option<String>,
  repository: Option<String>,
  registry: Option<String>,
) -> Result<()> {
  let global = Global::new_default().context("Failed to load global config")?;

  let runtime = language.unwrap_or(global.language);
  if runtime.is_empty() {
    bail!("a language runtime is required (--language)");
  }
  let template = template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
  let options = InitOptions {
    root: path.to_path_buf(),
    runtime,
    template: Some(template.clone()),
    registry: registry.or_else(|| Some(global.registry).filter(|r| !r.is_empty())),
    namespace: Some(global.namespace).filter(|n| !n.is_empty()),
    ..Default::default()
  };

  let f = init(&options, &super::templates(repository)).context("Failed to create function")?;

  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    format!("Created {} function '{}'", f.runtime, f.name).if_supports_color(Stream::Stdout, |s| s.bold())
  );
  print_stat("Path", &f.root.display().to_string());
  print_stat("Template", &template);
  if let Ok(image) = f.image_name() {
    print_stat("Image", &image);
  }
  Ok(())
}
