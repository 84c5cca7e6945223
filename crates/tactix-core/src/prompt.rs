//! Prompt assembly for a single analysis turn.

use tactix_protocol::{HistoryMessage, ModelContent, PromptSegment};

/// Builds the ordered segments sent with each new user turn.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_prompt: String,
}

impl PromptAssembler {
    /// Create an assembler around fixed system instructions.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Build the segments for a new turn.
    ///
    /// Segment 0 is always the system instruction text, followed by the
    /// message (verbatim) and then the image, each only when supplied.
    pub fn build(&self, message: Option<&str>, image: Option<&str>) -> Vec<PromptSegment> {
        let mut segments = Vec::with_capacity(3);
        segments.push(PromptSegment::text(self.system_prompt.clone()));
        if let Some(message) = message {
            segments.push(PromptSegment::text(message));
        }
        if let Some(image) = image {
            segments.push(PromptSegment::inline_image(image));
        }
        segments
    }
}

/// Translate caller history into model-side turns, preserving order.
///
/// The full history is replayed on every call; there is no windowing.
pub fn translate_history(history: &[HistoryMessage]) -> Vec<ModelContent> {
    history
        .iter()
        .map(|message| {
            ModelContent::new(
                message.role.to_model_role(),
                vec![PromptSegment::text(message.content.clone())],
            )
        })
        .collect()
}
