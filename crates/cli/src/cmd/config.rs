//! `fnkit config`: global settings.

use anyhow::{Context, Result};
use clap::Subcommand;

use fnkit_lib::config::{self, Global};

use crate::output::{print_stat, print_success};

#[derive(Subcommand)]
pub enum ConfigCommand {
  /// Show every setting
  List,

  /// Show one setting
  Get { key: String },

  /// Change one setting
  Set { key: String, value: String },
}

pub fn cmd_config(command: ConfigCommand) -> Result<()> {
  let mut global = Global::new_default().context("Failed to load global config")?;

  match command {
    ConfigCommand::List => {
      for key in Global::keys() {
        print_stat(key, &global.get(key)?);
      }
    }
    ConfigCommand::Get { key } => println!("{}", global.get(&key)?),
    ConfigCommand::Set { key, value } => {
      global.set(&key, &value)?;
      let path = config::file()?;
      global
        .write(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
      print_success(&format!("{key} = {value}"));
    }
  }
  Ok(())
}
