//! Model provider seam shared by the pipeline and its test doubles.

use crate::{ModelContent, ModelRole, PromptSegment};
use async_trait::async_trait;
use std::time::Duration;

/// Errors surfaced by a model call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The call did not complete before the deadline.
    #[error("model request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Transport or protocol failure reported by the endpoint.
    #[error("{0}")]
    Upstream(String),
}

/// One generation call: the seeded history plus the new user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Prior turns, oldest first.
    pub history: Vec<ModelContent>,
    /// Segments of the new user turn.
    pub message: Vec<PromptSegment>,
}

impl GenerateRequest {
    /// Full ordered contents: history followed by the new user turn.
    pub fn contents(&self) -> Vec<ModelContent> {
        let mut contents = self.history.clone();
        contents.push(ModelContent::new(ModelRole::User, self.message.clone()));
        contents
    }
}

/// Transport to a generative model endpoint.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Issue one call and return the text of the first candidate, if any.
    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>, ClientError>;
}
