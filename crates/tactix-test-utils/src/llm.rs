use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tactix_protocol::{ClientError, GenerateRequest, ModelProvider};

#[derive(Debug, Clone)]
pub struct FixedModel {
    reply: Option<String>,
}

impl FixedModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }

    /// Model whose first candidate carries no text.
    pub fn empty() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl ModelProvider for FixedModel {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<Option<String>, ClientError> {
        Ok(self.reply.clone())
    }
}

/// Records every request it receives and answers with a fixed reply.
#[derive(Debug, Clone)]
pub struct RecordingModel {
    reply: String,
    seen: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl RecordingModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.seen.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl ModelProvider for RecordingModel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ClientError> {
        self.seen.lock().push(request.clone());
        Ok(Some(self.reply.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ModelProvider for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<Option<String>, ClientError> {
        Err(ClientError::Upstream(self.message.clone()))
    }
}

/// Model call that never resolves; used to exercise deadlines.
#[derive(Debug, Clone, Copy)]
pub struct PendingModel;

#[async_trait]
impl ModelProvider for PendingModel {
    fn name(&self) -> &str {
        "pending"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<Option<String>, ClientError> {
        std::future::pending().await
    }
}
