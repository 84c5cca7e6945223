//! Interactive chat session that keeps the conversation on the caller side.

use crate::remote::{AnalyzeTransport, RemoteError};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tactix_core::{ConversationStore, ImageError, ImageFile};
use tactix_protocol::{AnalysisRequest, Turn};
use thiserror::Error;

/// Errors surfaced by a chat session.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Neither text nor an image was provided.
    #[error("enter a message or attach an image")]
    EmptyInput,
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("failed to read image {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Transport(#[from] RemoteError),
}

/// Validated image waiting to be sent with the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    /// Base64 payload sent to the handler.
    pub payload: String,
    /// Data URL kept on the user turn for previews.
    pub preview: String,
}

/// Chat session over any transport.
///
/// Only successful exchanges are recorded. A failed send leaves both the
/// conversation and the pending image untouched so the user can retry.
pub struct ChatSession<T> {
    transport: T,
    store: ConversationStore,
    pending_image: Option<PendingImage>,
}

impl<T: AnalyzeTransport> ChatSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            store: ConversationStore::new(),
            pending_image: None,
        }
    }

    /// Validate an image and hold it for the next send.
    pub fn attach_image(&mut self, file: &ImageFile) -> Result<&PendingImage, ChatError> {
        file.validate()?;
        debug!(
            "image attached (mime_type={}, size={})",
            file.mime_type,
            file.size()
        );
        Ok(self.pending_image.insert(PendingImage {
            payload: file.to_base64(),
            preview: file.to_data_url(),
        }))
    }

    /// Read, validate and attach an image from disk.
    pub fn attach_image_path(&mut self, path: impl AsRef<Path>) -> Result<&PendingImage, ChatError> {
        let path = path.as_ref();
        let file = ImageFile::from_path(path).map_err(|source| ChatError::ReadImage {
            path: path.to_path_buf(),
            source,
        })?;
        self.attach_image(&file)
    }

    pub fn pending_image(&self) -> Option<&PendingImage> {
        self.pending_image.as_ref()
    }

    pub fn remove_image(&mut self) {
        self.pending_image = None;
    }

    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Send a message with the pending image and record the exchange.
    ///
    /// Returns the assistant turn on success.
    pub async fn send(&mut self, text: &str) -> Result<&Turn, ChatError> {
        let has_text = !text.trim().is_empty();
        if !has_text && self.pending_image.is_none() {
            return Err(ChatError::EmptyInput);
        }

        let request = AnalysisRequest {
            message: has_text.then(|| text.to_string()),
            image: self
                .pending_image
                .as_ref()
                .map(|image| image.payload.clone()),
            conversation_history: self.store.history(),
        };
        let sent_at = Utc::now();
        let response = self.transport.analyze(&request).await?;

        let replied_at = DateTime::parse_from_rfc3339(&response.timestamp)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .unwrap_or_else(|err| {
                warn!(
                    "response timestamp unreadable (value={}, error={})",
                    response.timestamp, err
                );
                Utc::now()
            });
        let image_ref = self.pending_image.take().map(|image| image.preview);
        Ok(self
            .store
            .record_exchange(text, image_ref, sent_at, response.reply, replied_at))
    }

    /// Drop the conversation and any pending image.
    pub fn clear(&mut self) {
        self.store.clear();
        self.pending_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::LocalAnalyzer;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tactix_config::PromptConfig;
    use tactix_core::{AnalysisClient, AnalysisHandler};
    use tactix_protocol::{ErrorCode, PromptSegment, Role};
    use tactix_test_utils::{FailingModel, RecordingModel};

    fn session_with(model: Arc<RecordingModel>) -> ChatSession<LocalAnalyzer> {
        let handler =
            AnalysisHandler::new(Some(AnalysisClient::new(model)), &PromptConfig::default());
        ChatSession::new(LocalAnalyzer::new(handler))
    }

    fn png() -> ImageFile {
        ImageFile::new("image/png", b"\x89PNG pixels".to_vec())
    }

    #[tokio::test]
    async fn blank_text_without_image_is_rejected_locally() {
        let model = Arc::new(RecordingModel::new("unused"));
        let mut session = session_with(model.clone());
        assert!(matches!(session.send("   ").await, Err(ChatError::EmptyInput)));
        assert_eq!(model.call_count(), 0);
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn successful_send_records_both_turns_and_clears_image() {
        let model = Arc::new(RecordingModel::new("4-4-2です"));
        let mut session = session_with(model.clone());
        let preview = session.attach_image(&png()).expect("attach").preview.clone();
        assert!(preview.starts_with("data:image/png;base64,"));

        let reply = session.send("布陣は？").await.expect("send");
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "4-4-2です");

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "布陣は？");
        assert_eq!(turns[0].image_ref.as_deref(), Some(preview.as_str()));
        assert!(session.pending_image().is_none());

        let sent = &model.requests()[0].message;
        assert_eq!(sent[2], PromptSegment::inline_image(png().to_base64()));
    }

    #[tokio::test]
    async fn later_sends_replay_history() {
        let model = Arc::new(RecordingModel::new("ok"));
        let mut session = session_with(model.clone());
        session.send("一つ目").await.expect("first");
        session.send("二つ目").await.expect("second");

        let requests = model.requests();
        assert_eq!(requests[0].history.len(), 0);
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(session.turns().len(), 4);
    }

    #[tokio::test]
    async fn failed_send_keeps_state() {
        let handler = AnalysisHandler::new(
            Some(AnalysisClient::new(Arc::new(FailingModel::new("quota exceeded")))),
            &PromptConfig::default(),
        );
        let mut session = ChatSession::new(LocalAnalyzer::new(handler));
        session.attach_image(&png()).expect("attach");

        let err = session.send("").await.expect_err("failure");
        assert_eq!(err.to_string(), "quota exceeded");
        match err {
            ChatError::Transport(remote) => {
                assert_eq!(remote.code(), Some(ErrorCode::InternalError))
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(session.turns().is_empty());
        assert!(session.pending_image().is_some());
    }

    #[tokio::test]
    async fn missing_key_surfaces_configuration_error() {
        let handler = AnalysisHandler::new(None, &PromptConfig::default());
        let mut session = ChatSession::new(LocalAnalyzer::new(handler));
        let err = session.send("hi").await.expect_err("failure");
        assert_eq!(err.to_string(), "Server configuration error");
    }

    #[test]
    fn invalid_image_is_not_attached() {
        let model = Arc::new(RecordingModel::new("unused"));
        let mut session = session_with(model);
        let gif = ImageFile::new("image/gif", vec![1, 2, 3]);
        assert!(matches!(
            session.attach_image(&gif),
            Err(ChatError::Image(ImageError::UnsupportedType(_)))
        ));
        assert!(session.pending_image().is_none());
    }

    #[tokio::test]
    async fn clear_drops_turns_and_image() {
        let model = Arc::new(RecordingModel::new("ok"));
        let mut session = session_with(model);
        session.send("hello").await.expect("send");
        session.attach_image(&png()).expect("attach");
        session.clear();
        assert!(session.turns().is_empty());
        assert!(session.pending_image().is_none());
    }
}
