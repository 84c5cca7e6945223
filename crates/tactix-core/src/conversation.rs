//! Caller-side conversation log.

use chrono::{DateTime, Utc};
use log::debug;
use tactix_protocol::{HistoryMessage, Role, Turn};
use uuid::Uuid;

/// Ordered, append-only log of turns for one caller session.
///
/// Turns are never removed individually; `clear` drops all of them at once.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new turn and return a reference to it.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        image_ref: Option<String>,
        created_at: DateTime<Utc>,
    ) -> &Turn {
        let turn = Turn {
            id: self.next_id(),
            role,
            content: content.into(),
            image_ref,
            created_at,
        };
        self.turns.push(turn);
        let index = self.turns.len() - 1;
        &self.turns[index]
    }

    /// Append the user turn and the assistant reply of one successful
    /// exchange, returning the assistant turn.
    pub fn record_exchange(
        &mut self,
        user_content: impl Into<String>,
        image_ref: Option<String>,
        sent_at: DateTime<Utc>,
        reply: impl Into<String>,
        replied_at: DateTime<Utc>,
    ) -> &Turn {
        debug!("recording exchange (turns_before={})", self.turns.len());
        self.append(Role::User, user_content, image_ref, sent_at);
        self.append(Role::Assistant, reply, None, replied_at)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// History replayed on the next request, oldest first.
    pub fn history(&self) -> Vec<HistoryMessage> {
        self.turns.iter().map(Turn::to_history).collect()
    }

    fn next_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.turns.iter().any(|turn| turn.id == id) {
                return id;
            }
        }
    }
}
