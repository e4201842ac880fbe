//! Logical validation of a descriptor.
//!
//! Every rule runs and contributes messages to a single [`ValidationErrors`];
//! nothing fails fast.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use super::env::{Env, Placeholder, looks_like_placeholder};
use super::label::Label;
use super::options::Options;
use super::volume::{STORAGE_MEDIUM_MEMORY, Volume};
use super::{Descriptor, Git};
use crate::consts::FUNCTION_FILE;

static ENV_VAR_NAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[-._a-zA-Z][-._a-zA-Z0-9]*$").expect("env name pattern is valid"));
static QUALIFIED_NAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("qualified name pattern is valid"));
static DNS1123_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").expect("subdomain pattern is valid")
});
static DNS1035_LABEL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").expect("dns label pattern is valid"));
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)(Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E|[eE][+-]?[0-9]+)?$")
    .expect("quantity pattern is valid")
});
static SCP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:[\w.-]+@)?[\w.-]+:[\w./~-][^:]*$").expect("scp address pattern is valid")
});

const GIT_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "file", "git+ssh"];

/// Aggregated validation failures, rendered under a single header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
  errors: Vec<String>,
}

impl ValidationErrors {
  pub fn messages(&self) -> &[String] {
    &self.errors
  }

  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn len(&self) -> usize {
    self.errors.len()
  }

  pub(crate) fn extend(&mut self, group: Vec<String>) {
    self.errors.extend(group);
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{FUNCTION_FILE}' contains errors:")?;
    for e in &self.errors {
      write!(f, "\n\t{e}")?;
    }
    Ok(())
  }
}

/// Run every rule against `f`. `Ok(())` when nothing is wrong.
pub fn validate(f: &Descriptor) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();
  errors.extend(validate_volumes(&f.run.volumes));
  errors.extend(validate_build_envs(&f.build.build_envs));
  errors.extend(validate_envs(&f.run.envs));
  errors.extend(validate_options(&f.deploy.options));
  errors.extend(validate_labels(&f.deploy.labels, &|name: &str| std::env::var(name).ok()));
  errors.extend(validate_git(&f.build.git));

  if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_volumes(volumes: &[Volume]) -> Vec<String> {
  let mut errors = Vec::new();
  for (i, vol) in volumes.iter().enumerate() {
    if let Some(pvc) = &vol.persistent_volume_claim
      && pvc.claim_name.is_none()
    {
      errors.push(format!("volume entry #{i} ({vol}) is missing claim name"));
    }
    if let Some(empty_dir) = &vol.empty_dir
      && !empty_dir.medium.is_empty()
      && empty_dir.medium != STORAGE_MEDIUM_MEMORY
    {
      errors.push(format!(
        "volume entry #{i} ({vol}) has invalid storage medium ({})",
        empty_dir.medium
      ));
    }
    match vol.source_count() {
      0 => errors.push(format!("volume entry #{i} ({vol}) is missing a volume type")),
      1 => {}
      _ => errors.push(format!("volume entry #{i} ({vol}) may not specify more than one volume type")),
    }
    if vol.path.is_none() {
      errors.push(format!("volume entry #{i} ({vol}) is missing path field"));
    }
  }
  errors
}

/// Build-time entries must be named and may only reference local env.
pub fn validate_build_envs(envs: &[Env]) -> Vec<String> {
  let mut errors = Vec::new();
  for (i, env) in envs.iter().enumerate() {
    match (&env.name, &env.value) {
      (None, None) => errors.push(format!("env entry #{i} is not properly set")),
      (Some(name), None) => errors.push(format!("env entry #{i} is missing value field, only name '{name}' is set")),
      (None, Some(value)) => errors.push(format!("env entry #{i} is missing name field, only value '{value}' is set")),
      (Some(name), Some(value)) => {
        if let Err(reason) = validate_env_var_name(name) {
          errors.push(format!("env entry #{i} has invalid name set: {name:?}; {reason}"));
        }
        if looks_like_placeholder(value) && !matches!(Placeholder::parse(value), Some(Placeholder::Env(_))) {
          errors.push(format!(
            "env entry #{i} with name '{name}' has invalid value field set, it has '{value}', but allowed is only '{{{{ env:MY_ENV }}}}'"
          ));
        }
      }
    }
  }
  errors
}

/// Runtime entries: unnamed entries must pull in a whole secret or config
/// map, named entries may reference local env or single keys.
pub fn validate_envs(envs: &[Env]) -> Vec<String> {
  let mut errors = Vec::new();
  for (i, env) in envs.iter().enumerate() {
    match (&env.name, &env.value) {
      (None, None) => errors.push(format!("env entry #{i} is not properly set")),
      (Some(name), None) => errors.push(format!("env entry #{i} is missing value field, only name '{name}' is set")),
      (None, Some(value)) => {
        if !Placeholder::parse(value).is_some_and(|p| p.is_whole()) {
          errors.push(format!(
            "env entry #{i} has invalid value field set, it has '{value}', but allowed is only '{{{{ secret:secretName }}}}' or '{{{{ configMap:configMapName }}}}'"
          ));
        }
      }
      (Some(name), Some(value)) => {
        if let Err(reason) = validate_env_var_name(name) {
          errors.push(format!("env entry #{i} has invalid name set: {name:?}; {reason}"));
        }
        if looks_like_placeholder(value) && !Placeholder::parse(value).is_some_and(|p| !p.is_whole()) {
          errors.push(format!(
            "env entry #{i} with name '{name}' has invalid value field set, it has '{value}', but allowed is only '{{{{ env:MY_ENV }}}}', '{{{{ secret:secretName:key }}}}' or '{{{{ configMap:configMapName:key }}}}'"
          ));
        }
      }
    }
  }
  errors
}

pub fn validate_options(options: &Options) -> Vec<String> {
  let mut errors = Vec::new();

  if let Some(scale) = &options.scale {
    if let Some(min) = scale.min
      && min < 0
    {
      errors.push(format!(
        "options field \"scale.min\" has invalid value set: {min}, the value must be greater than \"0\""
      ));
    }
    if let Some(max) = scale.max
      && max < 0
    {
      errors.push(format!(
        "options field \"scale.max\" has invalid value set: {max}, the value must be greater than \"0\""
      ));
    }
    if let (Some(min), Some(max)) = (scale.min, scale.max)
      && max < min
    {
      errors.push("options field \"scale.max\" value must be greater or equal to \"scale.min\"".to_string());
    }
    if let Some(metric) = &scale.metric
      && metric != "concurrency"
      && metric != "rps"
    {
      errors.push(format!(
        "options field \"scale.metric\" has invalid value set: {metric}, allowed is only \"concurrency\" or \"rps\""
      ));
    }
    if let Some(target) = scale.target
      && target < 0.01
    {
      errors.push(format!(
        "options field \"scale.target\" has value set to \"{target}\", but it must not be less than 0.01"
      ));
    }
    if let Some(utilization) = scale.utilization
      && !(1.0..=100.0).contains(&utilization)
    {
      errors.push(format!(
        "options field \"scale.utilization\" has value set to \"{utilization}\", but it must not be less than 1 or greater than 100"
      ));
    }
  }

  if let Some(resources) = &options.resources {
    let mut quantity = |field: &str, value: &Option<String>| {
      if let Some(value) = value
        && !QUANTITY.is_match(value)
      {
        errors.push(format!(
          "options field \"resources.{field}\" has invalid value set: \"{value}\"; quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'"
        ));
      }
    };
    if let Some(requests) = &resources.requests {
      quantity("requests.cpu", &requests.cpu);
      quantity("requests.memory", &requests.memory);
    }
    if let Some(limits) = &resources.limits {
      quantity("limits.cpu", &limits.cpu);
      quantity("limits.memory", &limits.memory);
      if let Some(concurrency) = limits.concurrency
        && concurrency < 0
      {
        errors.push(format!(
          "options field \"resources.limits.concurrency\" has value set to \"{concurrency}\", but it must not be less than 0"
        ));
      }
    }
  }

  errors
}

/// Labels need a qualified key; values are literal label values or a
/// `{{ env:NAME }}` reference whose resolved value is itself a legal value.
pub fn validate_labels(labels: &[Label], lookup: &dyn Fn(&str) -> Option<String>) -> Vec<String> {
  let mut errors = Vec::new();
  for (i, label) in labels.iter().enumerate() {
    let key = match (&label.key, &label.value) {
      (None, None) => {
        errors.push(format!("label entry #{i} is not properly set"));
        continue;
      }
      (None, Some(value)) => {
        errors.push(format!("label entry #{i} is missing key field, only value '{value}' is set"));
        continue;
      }
      (Some(key), _) => key,
    };

    if let Err(reason) = validate_label_key(key) {
      errors.push(format!("label entry #{i} has invalid key set: {key:?}; {reason}"));
    }

    let Some(value) = &label.value else {
      continue;
    };
    if !looks_like_placeholder(value) {
      if let Err(reason) = validate_label_value(value) {
        errors.push(format!("label entry #{i} has invalid value set: {value:?}; {reason}"));
      }
      continue;
    }
    match Placeholder::parse(value) {
      Some(Placeholder::Env(local)) => {
        let resolved = lookup(&local).unwrap_or_default();
        if let Err(reason) = validate_label_value(&resolved) {
          errors.push(format!(
            "label entry #{i} with key '{key}' has invalid value when the environment is evaluated: '{resolved}': {reason}"
          ));
        }
      }
      _ => errors.push(format!(
        "label entry #{i} with key '{key}' has invalid value field set, it has '{value}', but allowed is only '{{{{ env:MY_ENV }}}}'"
      )),
    }
  }
  errors
}

pub fn validate_git(git: &Git) -> Vec<String> {
  if git.url.is_empty() || is_git_address(&git.url) {
    return Vec::new();
  }
  vec![format!(
    "specified git URL '{}' is not valid; expected a transport URL ({}) or an SCP-style address",
    git.url,
    GIT_SCHEMES.join(", ")
  )]
}

fn is_git_address(address: &str) -> bool {
  match Url::parse(address) {
    Ok(url) => GIT_SCHEMES.contains(&url.scheme()) && (url.scheme() == "file" || url.has_host()),
    Err(_) => !address.contains("://") && SCP_ADDRESS.is_match(address),
  }
}

/// Errors from name validators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
  #[error("must not be empty")]
  Empty,

  #[error("must be no more than {0} characters")]
  TooLong(usize),

  #[error("{0}")]
  Pattern(&'static str),
}

/// Function names become DNS-1035 labels.
pub fn validate_function_name(name: &str) -> Result<(), NameError> {
  if name.is_empty() {
    return Err(NameError::Empty);
  }
  if name.len() > 63 {
    return Err(NameError::TooLong(63));
  }
  if !DNS1035_LABEL.is_match(name) {
    return Err(NameError::Pattern(
      "a name must consist of lower case alphanumeric characters or '-', start with an alphabetic character, and end with an alphanumeric character (e.g. 'my-name', or 'abc-123')",
    ));
  }
  Ok(())
}

pub fn validate_env_var_name(name: &str) -> Result<(), NameError> {
  if name.is_empty() {
    return Err(NameError::Empty);
  }
  if !ENV_VAR_NAME.is_match(name) {
    return Err(NameError::Pattern(
      "a valid environment variable name must consist of alphabetic characters, digits, '_', '-', or '.', and must not start with a digit",
    ));
  }
  Ok(())
}

/// A qualified name with an optional DNS subdomain prefix: `example.com/name`.
pub fn validate_label_key(key: &str) -> Result<(), NameError> {
  let (prefix, name) = match key.split_once('/') {
    Some((prefix, name)) => (Some(prefix), name),
    None => (None, key),
  };
  if let Some(prefix) = prefix {
    if prefix.is_empty() {
      return Err(NameError::Empty);
    }
    if prefix.len() > 253 {
      return Err(NameError::TooLong(253));
    }
    if !DNS1123_SUBDOMAIN.is_match(prefix) {
      return Err(NameError::Pattern(
        "prefix part must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character",
      ));
    }
  }
  if name.is_empty() {
    return Err(NameError::Empty);
  }
  if name.len() > 63 {
    return Err(NameError::TooLong(63));
  }
  if !QUALIFIED_NAME.is_match(name) {
    return Err(NameError::Pattern(
      "name part must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
    ));
  }
  Ok(())
}

/// Empty, or up to 63 characters starting and ending alphanumeric.
pub fn validate_label_value(value: &str) -> Result<(), NameError> {
  if value.is_empty() {
    return Ok(());
  }
  if value.len() > 63 {
    return Err(NameError::TooLong(63));
  }
  if !QUALIFIED_NAME.is_match(value) {
    return Err(NameError::Pattern(
      "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
    ));
  }
  Ok(())
}
