//! Per-user locations of the global configuration.

use std::env;
use std::path::PathBuf;

use crate::consts::APP_NAME;

pub const CONFIG_FILE: &str = "config.yaml";
pub const REPOSITORIES_DIR: &str = "repositories";

/// Overrides the location of the global config file.
pub const CONFIG_FILE_ENV: &str = "FNKIT_CONFIG_FILE";
/// Overrides the location of installed repositories.
pub const REPOSITORIES_PATH_ENV: &str = "FNKIT_REPOSITORIES_PATH";

fn non_empty_var(key: &str) -> Option<PathBuf> {
  env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  non_empty_var("USERPROFILE")
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  non_empty_var("HOME")
}

/// Returns the directory for configuration files for the application.
/// `None` when neither a config home nor a home directory is known.
#[cfg(windows)]
pub fn config_dir() -> Option<PathBuf> {
  non_empty_var("APPDATA").map(|p| p.join(APP_NAME))
}

/// Returns the directory for configuration files for the application.
/// `None` when neither a config home nor a home directory is known.
#[cfg(not(windows))]
pub fn config_dir() -> Option<PathBuf> {
  non_empty_var("XDG_CONFIG_HOME")
    .or_else(|| home_dir().map(|h| h.join(".config")))
    .map(|p| p.join(APP_NAME))
}

/// Global config file, honouring [`CONFIG_FILE_ENV`].
pub fn config_file() -> Option<PathBuf> {
  non_empty_var(CONFIG_FILE_ENV).or_else(|| config_dir().map(|d| d.join(CONFIG_FILE)))
}

/// Installed repositories, honouring [`REPOSITORIES_PATH_ENV`].
pub fn repositories_path() -> Option<PathBuf> {
  non_empty_var(REPOSITORIES_PATH_ENV).or_else(|| config_dir().map(|d| d.join(REPOSITORIES_DIR)))
}
