//! Conversation turns recorded on the caller side.

use crate::{HistoryMessage, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a turn.
pub type TurnId = Uuid;

/// Immutable record of one message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Unique id within the conversation.
    pub id: TurnId,
    /// Author of the turn.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Opaque reference to an attached image (for example a data-URL preview).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Project the turn onto the history shape replayed to the model.
    pub fn to_history(&self) -> HistoryMessage {
        HistoryMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}
