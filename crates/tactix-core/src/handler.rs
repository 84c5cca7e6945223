//! Request handling: validation, dispatch, and response normalization.
//!
//! A request moves through `Received -> Validated -> Dispatched` and ends
//! either `Completed` with an `AnalysisResponse` or `Failed` with an
//! `ErrorEnvelope`. The handler keeps no state between requests.

use crate::client::{AnalysisClient, GeminiProvider};
use crate::error::{AnalysisError, ValidationError};
use crate::image;
use crate::prompt::{PromptAssembler, translate_history};
use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tactix_config::{PromptConfig, TactixConfig};
use tactix_protocol::{AnalysisRequest, AnalysisResponse, ErrorEnvelope};

/// HTTP method of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(method) => method,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let method = match value.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        };
        Ok(method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which inputs a validated request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    TextOnly,
    ImageOnly,
    TextAndImage,
}

impl InputShape {
    /// Classify a request; `None` when neither input is present.
    pub fn of(request: &AnalysisRequest) -> Option<Self> {
        match (request.message_text(), request.image_payload()) {
            (Some(_), Some(_)) => Some(InputShape::TextAndImage),
            (Some(_), None) => Some(InputShape::TextOnly),
            (None, Some(_)) => Some(InputShape::ImageOnly),
            (None, None) => None,
        }
    }
}

/// Body of a handler reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Success(AnalysisResponse),
    Error(ErrorEnvelope),
    /// Empty JSON object, used for preflight answers.
    Empty,
}

/// Transport-neutral reply: status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl ApiReply {
    pub fn success(response: AnalysisResponse) -> Self {
        Self {
            status: 200,
            body: ReplyBody::Success(response),
        }
    }

    pub fn failure(err: &AnalysisError) -> Self {
        Self {
            status: err.status(),
            body: ReplyBody::Error(err.to_envelope()),
        }
    }

    pub fn empty() -> Self {
        Self {
            status: 200,
            body: ReplyBody::Empty,
        }
    }

    /// Serialized JSON body.
    pub fn to_json(&self) -> String {
        let encoded = match &self.body {
            ReplyBody::Empty => return "{}".to_string(),
            ReplyBody::Success(response) => serde_json::to_string(response),
            ReplyBody::Error(envelope) => serde_json::to_string(envelope),
        };
        encoded.unwrap_or_else(|err| {
            error!("failed to encode reply: {}", err);
            r#"{"error":"Internal server error","code":"INTERNAL_ERROR"}"#.to_string()
        })
    }
}

/// Parse a raw request body into an `AnalysisRequest`.
///
/// Checks run in order: missing body, then JSON shape, then content.
pub fn parse_request(body: Option<&str>) -> Result<AnalysisRequest, ValidationError> {
    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return Err(ValidationError::MissingBody),
    };
    let request: AnalysisRequest = serde_json::from_str(body)
        .map_err(|err| ValidationError::InvalidJson(err.to_string()))?;
    if InputShape::of(&request).is_none() {
        return Err(ValidationError::MissingContent);
    }
    Ok(request)
}

/// Validates inbound requests and dispatches them to the model.
#[derive(Clone)]
pub struct AnalysisHandler {
    client: Option<AnalysisClient>,
    assembler: PromptAssembler,
    default_image_prompt: String,
}

impl AnalysisHandler {
    /// Create a handler around an already-built client.
    ///
    /// `None` means no credential is configured; every valid request then
    /// fails with `MISSING_API_KEY` without touching the network.
    pub fn new(client: Option<AnalysisClient>, prompts: &PromptConfig) -> Self {
        Self {
            client,
            assembler: PromptAssembler::new(prompts.system_prompt.clone()),
            default_image_prompt: prompts.default_image_prompt.clone(),
        }
    }

    /// Build the handler and its Gemini client from configuration.
    pub fn from_config(config: &TactixConfig) -> Self {
        let client = match (config.model.provider.as_str(), config.api_key()) {
            (provider, _) if provider != "gemini" => {
                error!(
                    "unsupported model provider (provider={}); analysis requests will fail",
                    provider
                );
                None
            }
            (_, Some(api_key)) => {
                let provider = GeminiProvider::new(api_key, &config.model);
                info!(
                    "model client ready (provider={}, model={}, endpoint={}, timeout_ms={})",
                    config.model.provider,
                    config.model.name,
                    provider.endpoint(),
                    config.model.timeout_ms
                );
                Some(
                    AnalysisClient::new(Arc::new(provider))
                        .with_timeout(Duration::from_millis(config.model.timeout_ms)),
                )
            }
            (_, None) => {
                warn!("GEMINI_API_KEY not set; analysis requests will fail");
                None
            }
        };
        Self::new(client, &config.prompts)
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn system_prompt(&self) -> &str {
        self.assembler.system_prompt()
    }

    /// Handle one request end to end, always producing a JSON reply.
    pub async fn handle(&self, method: &HttpMethod, body: Option<&str>) -> ApiReply {
        let received = Instant::now();
        match method {
            HttpMethod::Options => return ApiReply::empty(),
            HttpMethod::Post => {}
            other => {
                debug!("rejecting request (method={})", other);
                return ApiReply::failure(&AnalysisError::MethodNotAllowed(other.to_string()));
            }
        }

        let request = match parse_request(body) {
            Ok(request) => request,
            Err(err) => {
                debug!("request failed validation (reason={:?})", err);
                return ApiReply::failure(&AnalysisError::from(err));
            }
        };
        match self.dispatch(&request, received).await {
            Ok(response) => ApiReply::success(response),
            Err(err) => ApiReply::failure(&err),
        }
    }

    /// Analyze an already-parsed request.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, AnalysisError> {
        self.dispatch(request, Instant::now()).await
    }

    async fn dispatch(
        &self,
        request: &AnalysisRequest,
        received: Instant,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let shape = InputShape::of(request).ok_or(ValidationError::MissingContent)?;
        let Some(client) = self.client.as_ref() else {
            error!("GEMINI_API_KEY is not set");
            return Err(AnalysisError::MissingApiKey);
        };

        let image = request.image_payload().map(image::payload_of);
        let message = match shape {
            InputShape::ImageOnly => Some(self.default_image_prompt.as_str()),
            InputShape::TextOnly | InputShape::TextAndImage => request.message_text(),
        };
        let segments = self.assembler.build(message, image);
        let history = translate_history(&request.conversation_history);
        debug!(
            "dispatching analysis (shape={:?}, history_len={}, image_len={})",
            shape,
            history.len(),
            image.map(str::len).unwrap_or(0)
        );

        let reply = client.send(history, segments).await.map_err(AnalysisError::from)?;
        let processing_time_ms = u64::try_from(received.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "analysis completed (shape={:?}, reply_len={}, processing_time_ms={})",
            shape,
            reply.len(),
            processing_time_ms
        );
        Ok(AnalysisResponse {
            reply,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            processing_time_ms: Some(processing_time_ms),
        })
    }
}
