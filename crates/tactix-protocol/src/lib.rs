//! Wire protocol types for Tactix requests, responses, and conversation turns.

mod provider;
mod segment;
mod turn;

pub use provider::{ClientError, GenerateRequest, ModelProvider};
pub use segment::{INLINE_IMAGE_MIME_TYPE, ModelContent, ModelRole, PromptSegment};
pub use turn::{Turn, TurnId};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation message as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by the user.
    User,
    /// Reply produced by the analysis model.
    Assistant,
}

impl Role {
    /// Map a caller role onto the role identifier the model expects.
    pub fn to_model_role(self) -> ModelRole {
        match self {
            Role::User => ModelRole::User,
            Role::Assistant => ModelRole::Model,
        }
    }
}

/// Prior message replayed to the model as conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Message author.
    pub role: Role,
    /// Plain text content.
    pub content: String,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Inbound analysis request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Optional user text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional base64 image payload without a data-URL prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Full prior conversation, oldest first.
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

impl AnalysisRequest {
    /// Message text if present and non-empty.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|text| !text.is_empty())
    }

    /// Image payload if present and non-empty.
    pub fn image_payload(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
    }
}

/// Successful analysis response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Model reply text; may be empty.
    pub reply: String,
    /// ISO-8601 completion timestamp.
    pub timestamp: String,
    /// Wall-clock time spent handling the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

/// Fixed set of error codes exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingBody,
    MissingContent,
    InvalidJson,
    MissingApiKey,
    MethodNotAllowed,
    InternalError,
}

impl ErrorCode {
    /// HTTP status paired with the code.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::MissingBody | ErrorCode::MissingContent | ErrorCode::InvalidJson => 400,
            ErrorCode::MethodNotAllowed => 405,
            ErrorCode::MissingApiKey | ErrorCode::InternalError => 500,
        }
    }

    /// Wire spelling of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingBody => "MISSING_BODY",
            ErrorCode::MissingContent => "MISSING_CONTENT",
            ErrorCode::InvalidJson => "INVALID_JSON",
            ErrorCode::MissingApiKey => "MISSING_API_KEY",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized error body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code.
    pub code: ErrorCode,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}
