//! Configuration schema for Tactix.

use serde::{Deserialize, Serialize};

/// Root config for the Tactix service and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TactixConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl TactixConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> TactixConfigBuilder {
        TactixConfigBuilder::new()
    }

    /// Credential for the model endpoint, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.model
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Builder for assembling a `TactixConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct TactixConfigBuilder {
    config: TactixConfig,
}

impl TactixConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: TactixConfig::default(),
        }
    }

    /// Replace the model endpoint configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Replace the prompt configuration.
    pub fn prompts(mut self, prompts: PromptConfig) -> Self {
        self.config.prompts = prompts;
        self
    }

    /// Replace the HTTP server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Set the model credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.model.api_key = Some(api_key.into());
        self
    }

    /// Finalize and return the built `TactixConfig`.
    pub fn build(self) -> TactixConfig {
        self.config
    }
}

/// Model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Credential; usually supplied through the environment.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model_name(),
            api_version: default_api_version(),
            base_url: default_base_url(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Default hard timeout for one model call.
fn default_timeout_ms() -> u64 {
    45_000
}

/// Instruction texts sent with every analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Text used when a request carries an image but no message.
    #[serde(default = "default_image_prompt")]
    pub default_image_prompt: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            default_image_prompt: default_image_prompt(),
        }
    }
}

/// Built-in football tactical analyst instructions.
pub const DEFAULT_SYSTEM_PROMPT: &str = "あなたはプロサッカーの戦術アナリストです。
画像や動画から試合状況を分析し、具体的で実践的な戦術アドバイスを提供してください。

分析の観点:
- フォーメーションと選手配置
- スペースの活用状況
- プレスとプレス回避
- 攻守の切り替え
- ボール保持とポジショニング

回答形式:
- **必ずマークダウン形式で回答してください**
- 見出し(##, ###)と箇条書き(-, *)を使った構造化
- 具体的な改善案の提示
- 実例やプレーパターンの説明";

/// Built-in instruction for image-only requests.
pub const DEFAULT_IMAGE_PROMPT: &str = "この画像を分析してください";

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_image_prompt() -> String {
    DEFAULT_IMAGE_PROMPT.to_string()
}

/// HTTP boundary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_route")]
    pub route: String,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            route: default_route(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_route() -> String {
    "/api/analyze".to_string()
}

/// Large enough for a 4 MiB image after base64 expansion plus history.
fn default_body_limit_bytes() -> u64 {
    8 * 1024 * 1024
}
