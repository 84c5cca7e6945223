//! Error types for the analysis pipeline.

use crate::client::ClientError;
use std::time::Duration;
use tactix_protocol::{ErrorCode, ErrorEnvelope};
use thiserror::Error;

/// Caller payload was malformed or incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No request body was supplied.
    #[error("Request body is required")]
    MissingBody,
    /// Body did not parse as an analysis request.
    #[error("Invalid JSON in request body")]
    InvalidJson(String),
    /// Neither message nor image was supplied.
    #[error("Either message or image is required")]
    MissingContent,
}

/// Errors returned by the request handler.
///
/// The variants are diagnostic categories; all of them collapse to an
/// `ErrorEnvelope` at the boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Caller payload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No model credential is configured on the server.
    #[error("Server configuration error")]
    MissingApiKey,
    /// HTTP method other than POST/OPTIONS.
    #[error("Method not allowed")]
    MethodNotAllowed(String),
    /// Model call exceeded its deadline.
    #[error("model request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Model endpoint reported a failure.
    #[error("{0}")]
    Upstream(String),
    /// Anything else.
    #[error("{0}")]
    Unknown(String),
}

impl AnalysisError {
    /// Wire code for the error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::Validation(ValidationError::MissingBody) => ErrorCode::MissingBody,
            AnalysisError::Validation(ValidationError::InvalidJson(_)) => ErrorCode::InvalidJson,
            AnalysisError::Validation(ValidationError::MissingContent) => {
                ErrorCode::MissingContent
            }
            AnalysisError::MissingApiKey => ErrorCode::MissingApiKey,
            AnalysisError::MethodNotAllowed(_) => ErrorCode::MethodNotAllowed,
            AnalysisError::Timeout(_) | AnalysisError::Upstream(_) | AnalysisError::Unknown(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// HTTP status for the error.
    pub fn status(&self) -> u16 {
        self.code().http_status()
    }

    /// Normalized envelope sent to the caller.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let message = self.to_string();
        let message = if message.trim().is_empty() {
            "Internal server error".to_string()
        } else {
            message
        };
        ErrorEnvelope::new(self.code(), message)
    }
}

impl From<ClientError> for AnalysisError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Timeout(limit) => AnalysisError::Timeout(limit),
            ClientError::Upstream(message) => AnalysisError::Upstream(message),
        }
    }
}
