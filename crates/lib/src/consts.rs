//! Well-known names and default values shared across the crate.

/// Application name used for configuration directories.
pub const APP_NAME: &str = "fnkit";

/// Name of the function descriptor file at a project root.
pub const FUNCTION_FILE: &str = "func.yaml";

/// Hidden directory at a project root holding runtime data that is never
/// committed to source control.
pub const RUN_DATA_DIR: &str = ".func";

/// Name of the per-layer manifest file inside a template repository.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Name of the ignore file created alongside new functions.
pub const FUNC_IGNORE_FILE: &str = ".funcignore";

/// Name of the repository which holds the built-in templates.
pub const DEFAULT_REPOSITORY_NAME: &str = "default";

/// Template used when none is requested.
pub const DEFAULT_TEMPLATE: &str = "http";

/// Invocation format implied when a template declares none.
pub const DEFAULT_INVOKE: &str = "http";

/// Registry host prepended to single-token registries.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Builder used when neither the descriptor nor the global config names one.
pub const DEFAULT_BUILDER: &str = "pack";

/// Default size of the volume claim used by remote builds.
pub const DEFAULT_PVC_SIZE: &str = "256Mi";

pub const DEFAULT_LIVENESS_ENDPOINT: &str = "/health/liveness";
pub const DEFAULT_READINESS_ENDPOINT: &str = "/health/readiness";

/// Runtime directory name reserved for certificate material.
pub const RESERVED_CERTS_DIR: &str = "certs";

/// Template directory name reserved for code-generation scaffolding.
pub const RESERVED_SCAFFOLDING_DIR: &str = "scaffolding";
