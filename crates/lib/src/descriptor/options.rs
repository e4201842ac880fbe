//! Scaling and resource options for the deployed function.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scale: Option<ScaleOptions>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resources: Option<ResourcesOptions>,
}

impl Options {
  pub fn is_empty(&self) -> bool {
    self.scale.is_none() && self.resources.is_none()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<i64>,
  /// `concurrency` or `rps`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metric: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target: Option<f64>,
  /// Percentage in `1..=100`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub utilization: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcesOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub requests: Option<ResourceRequests>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limits: Option<ResourceLimits>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceRequests {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cpu: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceLimits {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cpu: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concurrency: Option<i64>,
}
