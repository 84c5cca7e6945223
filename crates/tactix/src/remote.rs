//! Transports that deliver an `AnalysisRequest` to a handler.
//!
//! `RemoteAnalyzer` talks to a running server over HTTP; `LocalAnalyzer`
//! calls an in-process `AnalysisHandler`. Both report failures as
//! `RemoteError` so callers treat them the same way.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tactix_core::AnalysisHandler;
use tactix_protocol::{AnalysisRequest, AnalysisResponse, ErrorCode, ErrorEnvelope};
use thiserror::Error;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/api/analyze";

/// Fallback text for error envelopes that carry no message.
const GENERIC_FAILURE: &str = "Failed to analyze image";

/// Errors returned while delivering a request.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with something other than JSON.
    #[error("Expected JSON response but got: {body}. API Endpoint: {endpoint}")]
    UnexpectedContent { endpoint: String, body: String },
    /// A JSON success body that does not match the response schema.
    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// The handler reported a failure.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },
}

impl RemoteError {
    /// Wire code of an API failure, when one was reported.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RemoteError::Api { code, .. } => *code,
            _ => None,
        }
    }
}

/// Delivers one analysis request and returns the normalized response.
#[async_trait]
pub trait AnalyzeTransport: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, RemoteError>;
}

/// HTTP client for a running analysis server.
#[derive(Debug, Clone)]
pub struct RemoteAnalyzer {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for RemoteAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl AnalyzeTransport for RemoteAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, RemoteError> {
        debug!(
            "posting analysis request (endpoint={}, history_len={}, has_image={})",
            self.endpoint,
            request.conversation_history.len(),
            request.image_payload().is_some()
        );
        let transport_error = |source| RemoteError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(transport_error)?;
        interpret_response(&self.endpoint, status, content_type.as_deref(), &body)
    }
}

/// Turn a raw HTTP answer into a response or a `RemoteError`.
pub(crate) fn interpret_response(
    endpoint: &str,
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<AnalysisResponse, RemoteError> {
    let is_json = content_type
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        warn!(
            "endpoint answered without JSON (endpoint={}, status={})",
            endpoint,
            status.as_u16()
        );
        let body = if body.is_empty() {
            "empty response".to_string()
        } else {
            body.to_string()
        };
        return Err(RemoteError::UnexpectedContent {
            endpoint: endpoint.to_string(),
            body,
        });
    }

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => RemoteError::Api {
                status: status.as_u16(),
                code: Some(envelope.code),
                message: if envelope.error.is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    envelope.error
                },
            },
            Err(_) => RemoteError::Api {
                status: status.as_u16(),
                code: None,
                message: format!("HTTP {status}"),
            },
        });
    }

    serde_json::from_str(body).map_err(|source| RemoteError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Transport that calls an in-process handler without HTTP.
#[derive(Clone)]
pub struct LocalAnalyzer {
    handler: Arc<AnalysisHandler>,
}

impl LocalAnalyzer {
    pub fn new(handler: AnalysisHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl AnalyzeTransport for LocalAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, RemoteError> {
        self.handler.analyze(request).await.map_err(|err| {
            let envelope = err.to_envelope();
            RemoteError::Api {
                status: err.status(),
                code: Some(envelope.code),
                message: envelope.error,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ENDPOINT: &str = "http://localhost:8787/api/analyze";

    #[test]
    fn success_body_decodes() {
        let body = json!({
            "reply": "## 分析",
            "timestamp": "2026-01-01T00:00:00.000Z",
            "processingTimeMs": 42
        })
        .to_string();
        let response =
            interpret_response(ENDPOINT, StatusCode::OK, Some("application/json"), &body)
                .expect("response");
        assert_eq!(response.reply, "## 分析");
        assert_eq!(response.processing_time_ms, Some(42));
    }

    #[test]
    fn html_answer_names_the_endpoint() {
        let err = interpret_response(
            ENDPOINT,
            StatusCode::BAD_GATEWAY,
            Some("text/html"),
            "<h1>Bad Gateway</h1>",
        )
        .expect_err("unexpected content");
        assert!(matches!(err, RemoteError::UnexpectedContent { .. }));
        assert_eq!(
            err.to_string(),
            "Expected JSON response but got: <h1>Bad Gateway</h1>. API Endpoint: http://localhost:8787/api/analyze"
        );
    }

    #[test]
    fn missing_content_type_and_empty_body() {
        let err = interpret_response(ENDPOINT, StatusCode::OK, None, "").expect_err("error");
        assert!(err.to_string().contains("empty response"));
    }

    #[test]
    fn error_envelope_text_is_surfaced() {
        let body = json!({ "error": "Either message or image is required", "code": "MISSING_CONTENT" })
            .to_string();
        let err = interpret_response(
            ENDPOINT,
            StatusCode::BAD_REQUEST,
            Some("application/json; charset=utf-8"),
            &body,
        )
        .expect_err("api error");
        assert_eq!(err.to_string(), "Either message or image is required");
        assert_eq!(err.code(), Some(ErrorCode::MissingContent));
    }

    #[test]
    fn unparseable_error_falls_back_to_status() {
        let err = interpret_response(
            ENDPOINT,
            StatusCode::SERVICE_UNAVAILABLE,
            Some("application/json"),
            "[]",
        )
        .expect_err("api error");
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn blank_envelope_error_uses_generic_text() {
        let body = json!({ "error": "", "code": "INTERNAL_ERROR" }).to_string();
        let err = interpret_response(
            ENDPOINT,
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("application/json"),
            &body,
        )
        .expect_err("api error");
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }
}
