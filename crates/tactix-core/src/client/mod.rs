//! Outbound model calls with a hard deadline.
//!
//! `ModelProvider` is the transport seam (Gemini in production, substitutes
//! in tests). `AnalysisClient` wraps a provider with timeout enforcement and
//! reply normalization.

mod gemini;

pub use gemini::GeminiProvider;
pub use tactix_protocol::{ClientError, GenerateRequest, ModelProvider};

use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;
use tactix_protocol::{ModelContent, PromptSegment};

/// Default deadline for one model call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(45_000);

/// Owns the outbound call: deadline enforcement and reply extraction.
#[derive(Clone)]
pub struct AnalysisClient {
    provider: Arc<dyn ModelProvider>,
    timeout: Duration,
}

impl AnalysisClient {
    /// Create a client with the default deadline.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open a session seeded with translated history.
    pub fn start_session(&self, history: Vec<ModelContent>) -> AnalysisSession<'_> {
        AnalysisSession {
            client: self,
            history,
        }
    }

    /// Send one turn with the configured deadline.
    pub async fn send(
        &self,
        history: Vec<ModelContent>,
        segments: Vec<PromptSegment>,
    ) -> Result<String, ClientError> {
        self.send_with_timeout(history, segments, self.timeout)
            .await
    }

    /// Send one turn with an explicit deadline.
    pub async fn send_with_timeout(
        &self,
        history: Vec<ModelContent>,
        segments: Vec<PromptSegment>,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        self.start_session(history)
            .send_with_timeout(segments, timeout)
            .await
    }
}

/// Per-call context holding the seeded history.
///
/// Sending consumes the session, so each session issues exactly one call.
pub struct AnalysisSession<'a> {
    client: &'a AnalysisClient,
    history: Vec<ModelContent>,
}

impl AnalysisSession<'_> {
    pub fn history(&self) -> &[ModelContent] {
        &self.history
    }

    /// Send the new turn using the client's deadline.
    pub async fn send(self, segments: Vec<PromptSegment>) -> Result<String, ClientError> {
        let timeout = self.client.timeout;
        self.send_with_timeout(segments, timeout).await
    }

    async fn send_with_timeout(
        self,
        segments: Vec<PromptSegment>,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        let provider = self.client.provider.as_ref();
        let request = GenerateRequest {
            history: self.history,
            message: segments,
        };
        debug!(
            "sending model request (provider={}, history_len={}, segments={}, timeout_ms={})",
            provider.name(),
            request.history.len(),
            request.message.len(),
            timeout.as_millis()
        );
        match tokio::time::timeout(timeout, provider.generate(&request)).await {
            Ok(Ok(text)) => {
                let reply = text.unwrap_or_default();
                if reply.is_empty() {
                    warn!("model returned no text (provider={})", provider.name());
                }
                Ok(reply)
            }
            Ok(Err(err)) => {
                error!(
                    "model request failed (provider={}): {}",
                    provider.name(),
                    err
                );
                Err(err)
            }
            Err(_) => {
                warn!(
                    "model request timed out (provider={}, timeout_ms={})",
                    provider.name(),
                    timeout.as_millis()
                );
                Err(ClientError::Timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisClient, ClientError, GenerateRequest};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tactix_protocol::{ModelContent, ModelRole, PromptSegment};
    use tactix_test_utils::{FailingModel, FixedModel, PendingModel, RecordingModel};

    #[tokio::test]
    async fn returns_first_candidate_text() {
        let client = AnalysisClient::new(Arc::new(FixedModel::new("analysis")));
        let reply = client
            .send(Vec::new(), vec![PromptSegment::text("hi")])
            .await
            .expect("reply");
        assert_eq!(reply, "analysis");
    }

    #[tokio::test]
    async fn missing_text_is_an_empty_reply() {
        let client = AnalysisClient::new(Arc::new(FixedModel::empty()));
        let reply = client
            .send(Vec::new(), vec![PromptSegment::text("hi")])
            .await
            .expect("reply");
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn upstream_errors_pass_through() {
        let client = AnalysisClient::new(Arc::new(FailingModel::new("503 unavailable")));
        let err = client
            .send(Vec::new(), vec![PromptSegment::text("hi")])
            .await
            .expect_err("failure");
        assert_eq!(err, ClientError::Upstream("503 unavailable".to_string()));
    }

    #[tokio::test]
    async fn pending_call_times_out_promptly() {
        let client = AnalysisClient::new(Arc::new(PendingModel))
            .with_timeout(Duration::from_millis(1));
        let started = Instant::now();
        let err = client
            .send(Vec::new(), vec![PromptSegment::text("hi")])
            .await
            .expect_err("timeout");
        assert_eq!(err, ClientError::Timeout(Duration::from_millis(1)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn session_sends_history_then_new_turn() {
        let model = Arc::new(RecordingModel::new("ok"));
        let client = AnalysisClient::new(model.clone());
        let history = vec![ModelContent::new(
            ModelRole::Model,
            vec![PromptSegment::text("earlier")],
        )];
        let session = client.start_session(history.clone());
        assert_eq!(session.history(), history.as_slice());
        session
            .send(vec![PromptSegment::text("now")])
            .await
            .expect("reply");

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            GenerateRequest {
                history,
                message: vec![PromptSegment::text("now")],
            }
        );
        assert_eq!(requests[0].contents().len(), 2);
        assert_eq!(requests[0].contents()[1].role, ModelRole::User);
    }
}
