//! Prompt segments and model-side conversation content.

use serde::{Deserialize, Serialize};

/// MIME type attached to every inline image segment.
pub const INLINE_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// One atomic unit of a multimodal prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum PromptSegment {
    /// Plain text block.
    Text(String),
    /// Inline image carried as a base64 payload.
    InlineImage { data: String, mime_type: String },
}

impl PromptSegment {
    pub fn text(text: impl Into<String>) -> Self {
        PromptSegment::Text(text.into())
    }

    /// Inline image using the fixed image MIME type.
    pub fn inline_image(data: impl Into<String>) -> Self {
        PromptSegment::InlineImage {
            data: data.into(),
            mime_type: INLINE_IMAGE_MIME_TYPE.to_string(),
        }
    }
}

/// Role identifiers understood by the model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    User,
    Model,
}

impl ModelRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelRole::User => "user",
            ModelRole::Model => "model",
        }
    }
}

/// A single model-side turn: a role plus its ordered parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelContent {
    pub role: ModelRole,
    pub parts: Vec<PromptSegment>,
}

impl ModelContent {
    pub fn new(role: ModelRole, parts: Vec<PromptSegment>) -> Self {
        Self { role, parts }
    }
}
