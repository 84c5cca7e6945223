//! Deployment mode detection and environment-style overrides.

use crate::{ConfigError, TactixConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Variable selecting the deployment mode.
pub const DEPLOYMENT_MODE_VAR: &str = "TACTIX_ENV";
/// Variable carrying the model credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Variable overriding the model call timeout in milliseconds.
pub const TIMEOUT_MS_VAR: &str = "GEMINI_API_TIMEOUT_MS";
/// Flat JSON file of environment-style values loaded in development.
pub const ENV_LOCAL_FILE: &str = "env.local.json";

const KNOWN_VARS: &[&str] = &[API_KEY_VAR, TIMEOUT_MS_VAR];

/// Where the service runs; controls whether local files are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Local development: cwd config and `env.local.json` are loaded.
    #[default]
    Development,
    /// Deployed: only user, runtime, and environment sources apply.
    Production,
}

impl DeploymentMode {
    /// Parse a mode flag; anything other than `production` is development.
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("production") => DeploymentMode::Production,
            _ => DeploymentMode::Development,
        }
    }

    /// Read the mode from the process environment.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(DEPLOYMENT_MODE_VAR).ok().as_deref())
    }

    /// Whether cwd-local config files should be loaded.
    pub fn loads_local_files(self) -> bool {
        self == DeploymentMode::Development
    }
}

/// Environment-style key/value overrides applied after all file layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: BTreeMap<String, String>,
}

impl EnvOverrides {
    /// Empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the known variables from the process environment.
    pub fn from_process() -> Self {
        let mut overrides = Self::new();
        for key in KNOWN_VARS {
            if let Ok(value) = std::env::var(key) {
                overrides.vars.insert((*key).to_string(), value);
            }
        }
        overrides
    }

    /// Set a single variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Overlay values from an `env.local.json` file if it exists.
    ///
    /// Values from the file replace values already captured. Returns whether
    /// the file was found.
    pub fn merge_env_local(&mut self, path: &Path) -> Result<bool, ConfigError> {
        if !path.exists() {
            debug!("env.local file missing (path={})", path.display());
            return Ok(false);
        }
        let contents = crate::loader::read_file(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::InvalidField {
                path: format!("{}:root", path.display()),
                message: "expected object".to_string(),
            });
        };
        for (key, value) in map {
            let value = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => {
                    return Err(ConfigError::InvalidField {
                        path: format!("{}:{key}", path.display()),
                        message: "expected string, number, or bool".to_string(),
                    });
                }
            };
            self.vars.insert(key, value);
        }
        info!("loaded env.local overrides (path={})", path.display());
        Ok(true)
    }

    /// Apply the known variables onto a config.
    pub fn apply(&self, config: &mut TactixConfig) -> Result<(), ConfigError> {
        if let Some(api_key) = self.get(API_KEY_VAR) {
            let api_key = api_key.trim();
            if !api_key.is_empty() {
                config.model.api_key = Some(api_key.to_string());
            }
        }
        if let Some(raw) = self.get(TIMEOUT_MS_VAR) {
            let timeout_ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidField {
                    path: format!("env:{TIMEOUT_MS_VAR}"),
                    message: format!("expected integer milliseconds, got {raw:?}"),
                })?;
            config.model.timeout_ms = timeout_ms;
        }
        Ok(())
    }
}
