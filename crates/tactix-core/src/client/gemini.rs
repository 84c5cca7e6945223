//! Gemini `generateContent` transport.

use super::{ClientError, GenerateRequest, ModelProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tactix_config::ModelConfig;
use tactix_protocol::{ModelContent, PromptSegment};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Calls the Gemini REST API with one reusable HTTP client.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiProvider {
    /// Create a provider for the configured model.
    pub fn new(api_key: impl Into<String>, config: &ModelConfig) -> Self {
        Self::with_client(reqwest::Client::new(), api_key, config)
    }

    /// Create a provider that reuses an existing HTTP client.
    pub fn with_client(
        http: reqwest::Client,
        api_key: impl Into<String>,
        config: &ModelConfig,
    ) -> Self {
        let endpoint = format!(
            "{}/{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.api_version,
            config.name
        );
        Self {
            http,
            endpoint,
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ClientError> {
        let body = request_body(&request.contents());
        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ClientError::Upstream(format!("gemini request failed: {err}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            ClientError::Upstream(format!("failed to read gemini response: {err}"))
        })?;
        debug!(
            "gemini response received (status={}, body_len={})",
            status.as_u16(),
            text.len()
        );
        if !status.is_success() {
            return Err(ClientError::Upstream(error_message(status, &text)));
        }
        parse_reply(&text)
    }
}

/// Build the `generateContent` JSON body.
fn request_body(contents: &[ModelContent]) -> Value {
    let contents = contents
        .iter()
        .map(|content| {
            let parts = content
                .parts
                .iter()
                .map(|part| match part {
                    PromptSegment::Text(text) => json!({ "text": text }),
                    PromptSegment::InlineImage { data, mime_type } => json!({
                        "inlineData": { "mimeType": mime_type, "data": data }
                    }),
                })
                .collect::<Vec<_>>();
            json!({ "role": content.role.as_str(), "parts": parts })
        })
        .collect::<Vec<_>>();
    json!({ "contents": contents })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Concatenate the text parts of the first candidate.
fn parse_reply(body: &str) -> Result<Option<String>, ClientError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|err| ClientError::Upstream(format!("invalid gemini response: {err}")))?;
    let Some(content) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
    else {
        return Ok(None);
    };
    let texts = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>();
    if texts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(texts.concat()))
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(label) => format!(
                "gemini request failed ({} {}): {}",
                status.as_u16(),
                label,
                parsed.error.message
            ),
            None => format!(
                "gemini request failed ({}): {}",
                status.as_u16(),
                parsed.error.message
            ),
        },
        Err(_) => format!("gemini request failed ({})", status),
    }
}
