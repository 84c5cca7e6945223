//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config or env.local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The working directory used to locate local layers is unusable.
    #[error("failed to resolve config directory {}: {source}", path.display())]
    ResolveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON5 syntax error in a config layer.
    #[error("failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    /// Merged values do not decode into `TactixConfig`, or env.local is not JSON.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}
