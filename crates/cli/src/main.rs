use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::{ConfigCommand, RepositoryCommand};
use output::{OutputFormat, print_error};

/// fnkit - Function project scaffolding and metadata
#[derive(Parser)]
#[command(name = "fnkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create a function from a template
  Create {
    /// Directory to create the function in
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Language runtime (defaults to the global `language` setting)
    #[arg(short, long)]
    language: Option<String>,

    /// Template name, optionally `repository/name`
    #[arg(short, long)]
    template: Option<String>,

    /// Use only the repository at this URI
    #[arg(short, long)]
    repository: Option<String>,

    /// Container registry for the function image
    #[arg(long)]
    registry: Option<String>,
  },

  /// List available templates
  Templates {
    /// Only list templates for this runtime
    runtime: Option<String>,

    /// Use only the repository at this URI
    #[arg(short, long)]
    repository: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Manage installed template repositories
  #[command(subcommand)]
  Repository(RepositoryCommand),

  /// Upgrade func.yaml to the current schema
  Migrate {
    #[arg(default_value = ".")]
    path: PathBuf,
  },

  /// Show a function's metadata and build status
  Info {
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Record the current source tree as built
  Stamp {
    #[arg(default_value = ".")]
    path: PathBuf,
  },

  /// Print the function's runtime environment
  Envs {
    #[arg(default_value = ".")]
    path: PathBuf,
  },

  /// Read and change global settings
  #[command(subcommand)]
  Config(ConfigCommand),
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(e) = run(cli.command) {
    print_error(&format!("{e:#}"));
    std::process::exit(1);
  }
}

fn run(command: Commands) -> Result<()> {
  match command {
    Commands::Create {
      path,
      language,
      template,
      repository,
      registry,
    } => cmd::cmd_create(&path, language, template, repository, registry),
    Commands::Templates {
      runtime,
      repository,
      output,
    } => cmd::cmd_templates(runtime.as_deref(), repository, output),
    Commands::Repository(command) => cmd::cmd_repository(command),
    Commands::Migrate { path } => cmd::cmd_migrate(&path),
    Commands::Info { path, output } => cmd::cmd_info(&path, output),
    Commands::Stamp { path } => cmd::cmd_stamp(&path),
    Commands::Envs { path } => cmd::cmd_envs(&path),
    Commands::Config(command) => cmd::cmd_config(command),
  }
}
