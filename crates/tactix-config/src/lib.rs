//! Configuration models and layered config loading.
//!
//! This crate owns the Tactix config schema, validation, deployment-mode
//! handling, and the layer-merging logic used by the server and CLI.

mod env;
mod error;
mod loader;
mod model;

/// Deployment mode and environment-style overrides.
pub use env::{
    API_KEY_VAR, DEPLOYMENT_MODE_VAR, DeploymentMode, ENV_LOCAL_FILE, EnvOverrides,
    TIMEOUT_MS_VAR,
};
/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
