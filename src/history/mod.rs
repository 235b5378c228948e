use crate::models::chat::Message;
use uuid::Uuid;

/// Retained window: only the most recent entries are kept and sent.
pub const HISTORY_LIMIT: usize = 10;

/// In-memory, append-only conversation history for one session.
///
/// The store holds at most [`HISTORY_LIMIT`] messages; exceeding the cap
/// evicts the oldest entries first. There are no edit, removal, or reorder
/// operations, and the full window is serialized on every request.
#[derive(Debug)]
pub struct ConversationStore {
    id: Uuid,
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append one message, evicting from the front once the cap is exceeded.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() > HISTORY_LIMIT {
            let excess = self.messages.len() - HISTORY_LIMIT;
            self.messages.drain(..excess);
        }
    }

    /// The exact ordered sequence transmitted on every turn.
    pub fn payload(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all history, starting the session over under the same id.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
