use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_templates(runtime: Option<&str>, repository: Option<String>, output: OutputFormat) -> Result<()> {
  let templates = super::templates(repository);

  let runtimes: Vec<String> = match runtime {
    Some(runtime) => vec![runtime.to_string()],
    None => {
      let repos = templates.repositories().all().context("Failed to load repositories")?;
      let names: BTreeSet<String> = repos
        .iter()
        .flat_map(|r| r.runtimes.iter().map(|rt| rt.name.clone()))
        .collect();
      names.into_iter().collect()
    }
  };

  let mut listing = BTreeMap::new();
  for runtime in runtimes {
    let names = templates
      .list(&runtime)
      .with_context(|| format!("Failed to list templates for {runtime}"))?;
    listing.insert(runtime, names);
  }

  if output.is_json() {
    return print_json(&listing);
  }
  for (runtime, names) in &listing {
    println!("{runtime}");
    for name in names {
      print_stat("template", name);
    }
  }
  Ok(())
}
