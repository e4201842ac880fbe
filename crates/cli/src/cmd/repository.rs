//! `fnkit repository`: install, rename and remove template repositories.

use anyhow::{Context, Result};
use clap::Subcommand;

use fnkit_lib::config;

use crate::output::{print_info, print_success};

#[derive(Subcommand)]
pub enum RepositoryCommand {
  /// List installed repositories
  List,

  /// Install a repository from a git URL or local path
  Add {
    /// Name to install under (defaults to one derived from the URL)
    #[arg(long)]
    name: Option<String>,

    url: String,
  },

  /// Rename an installed repository
  Rename { old: String, new: String },

  /// Remove an installed repository
  Remove { name: String },
}

pub fn cmd_repository(command: RepositoryCommand) -> Result<()> {
  let repos = super::repositories(None);

  match command {
    RepositoryCommand::List => {
      for name in repos.list().context("Failed to load repositories")? {
        println!("{name}");
      }
    }
    RepositoryCommand::Add { name, url } => {
      config::create_paths().context("Failed to create config directories")?;
      let added = repos
        .add(name.as_deref(), &url)
        .with_context(|| format!("Failed to add repository {url}"))?;
      print_success(&format!("Repository added: {added}"));
    }
    RepositoryCommand::Rename { old, new } => {
      repos
        .rename(&old, &new)
        .with_context(|| format!("Failed to rename repository {old}"))?;
      print_success(&format!("Repository renamed: {old} -> {new}"));
    }
    RepositoryCommand::Remove { name } => {
      repos
        .remove(&name)
        .with_context(|| format!("Failed to remove repository {name}"))?;
      print_info(&format!("Repository removed: {name}"));
    }
  }
  Ok(())
}
