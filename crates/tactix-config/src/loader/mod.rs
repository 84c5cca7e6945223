//! Layered configuration loader with deployment-mode gating.
//!
//! Discovers configuration layers (user/cwd/runtime), validates schema,
//! merges them, applies environment-style overrides, and produces a final
//! `TactixConfig`.

mod layer_io;
mod merge;
mod schema;


pub(crate) use layer_io::read_file;

use crate::{ConfigError, DeploymentMode, ENV_LOCAL_FILE, EnvOverrides, TactixConfig};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "tactix.json5";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".tactix";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: TactixConfig,
    /// Metadata for each layer considered during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Runtime overrides passed explicitly.
    Runtime,
    /// Environment variables and `env.local.json` (highest precedence).
    Environment,
}

/// Metadata about a config layer, including disabled reason when skipped.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin (user, cwd, runtime, environment).
    pub source: ConfigLayerSource,
    /// Location on disk if present.
    pub path: Option<PathBuf>,
    /// Reason the layer was skipped or disabled.
    pub disabled_reason: Option<String>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve local layers.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.tactix/tactix.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied after file layers.
    pub runtime_paths: Vec<PathBuf>,
    /// Deployment mode; production skips cwd-local files.
    pub mode: DeploymentMode,
    /// Environment-style values applied last.
    pub env: EnvOverrides,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations and the process environment.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            mode: DeploymentMode::from_env(),
            env: EnvOverrides::from_process(),
        }
    }

    /// Add a runtime override config path.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Override the deployment mode.
    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the environment-style overrides.
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }
}

impl TactixConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = layer_io::read_file(path.as_ref())?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): user, cwd, runtime overrides,
    /// environment (process variables overlaid by `env.local.json`).
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_io::resolve_dir(&options.cwd)?;
        debug!(
            "normalized cwd for config load: {} (mode={:?})",
            cwd.display(),
            options.mode
        );
        let mut layers = Vec::new();
        let mut merge_layers = Vec::new();
        let mut seen_paths = HashSet::new();

        if let Some(layer) = layer_io::load_optional_layer(
            ConfigLayerSource::User,
            options.user_config_path.as_deref(),
        )? {
            debug!("loaded user layer");
            if let Some(path) = layer.meta.path.as_deref() {
                seen_paths.insert(layer_io::dedup_key(path));
            }
            layers.push(layer.meta.clone());
            merge_layers.push(layer);
        }

        let local_disabled_reason = (!options.mode.loads_local_files())
            .then(|| "local config files are ignored in production".to_string());
        load_local_layer(
            LocalLayer {
                source: ConfigLayerSource::Cwd,
                path: cwd.join(DEFAULT_CONFIG_FILE),
                disabled_reason: local_disabled_reason.clone(),
            },
            &mut layers,
            &mut merge_layers,
            &mut seen_paths,
        )?;

        for runtime_path in &options.runtime_paths {
            let loaded = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(loaded.meta.clone());
            merge_layers.push(loaded);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        for layer in merge_layers {
            merge::merge_json_values(&mut merged, &layer.value);
        }
        schema::validate_layer_schema(&merged, "effective")?;
        let mut config: TactixConfig = serde_json::from_value(merged)?;

        let mut env = options.env;
        let env_local_path = cwd.join(ENV_LOCAL_FILE);
        match local_disabled_reason {
            Some(reason) => {
                if env_local_path.exists() {
                    warn!(
                        "env.local file ignored (path={}, reason={})",
                        env_local_path.display(),
                        reason
                    );
                }
                layers.push(ConfigLayer {
                    source: ConfigLayerSource::Environment,
                    path: None,
                    disabled_reason: None,
                });
            }
            None => {
                let found = env.merge_env_local(&env_local_path)?;
                layers.push(ConfigLayer {
                    source: ConfigLayerSource::Environment,
                    path: found.then_some(env_local_path),
                    disabled_reason: None,
                });
            }
        }
        env.apply(&mut config)?;
        config.validate()?;

        info!(
            "layered config loaded (layers={}, api_key_configured={})",
            layers.len(),
            config.api_key().is_some()
        );
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.timeout_ms == 0 {
            return Err(ConfigError::InvalidField {
                path: "model.timeout_ms".to_string(),
                message: "timeout must be greater than zero".to_string(),
            });
        }
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                path: "model.name".to_string(),
                message: "model name cannot be empty".to_string(),
            });
        }
        if !self.server.route.starts_with('/') {
            return Err(ConfigError::InvalidField {
                path: "server.route".to_string(),
                message: "route must start with '/'".to_string(),
            });
        }
        Ok(())
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

/// Internal representation for layer candidates on disk.
#[derive(Debug, Clone)]
struct LocalLayer {
    source: ConfigLayerSource,
    path: PathBuf,
    disabled_reason: Option<String>,
}

fn config_from_value(value: Value, label: &str) -> Result<TactixConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: TactixConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn load_local_layer(
    layer: LocalLayer,
    layers: &mut Vec<ConfigLayer>,
    merge_layers: &mut Vec<LoadedLayer>,
    seen_paths: &mut HashSet<PathBuf>,
) -> Result<(), ConfigError> {
    if !layer.path.exists() {
        debug!(
            "skipping missing layer (source={:?}, path={})",
            layer.source,
            layer.path.display()
        );
        return Ok(());
    }
    let unique = layer_io::dedup_key(&layer.path);
    if !seen_paths.insert(unique) {
        debug!(
            "skipping duplicate layer (source={:?}, path={})",
            layer.source,
            layer.path.display()
        );
        return Ok(());
    }
    if let Some(disabled_reason) = layer.disabled_reason.clone() {
        warn!(
            "layer disabled (source={:?}, path={}, reason={})",
            layer.source,
            layer.path.display(),
            disabled_reason
        );
        layers.push(ConfigLayer {
            source: layer.source,
            path: Some(layer.path),
            disabled_reason: Some(disabled_reason),
        });
        return Ok(());
    }
    let loaded = layer_io::load_required_layer(layer.source, &layer.path)?;
    debug!(
        "loaded layer (source={:?}, path={})",
        layer.source,
        layer.path.display()
    );
    layers.push(loaded.meta.clone());
    merge_layers.push(loaded);
    Ok(())
}
