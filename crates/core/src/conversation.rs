//! Per-turn conversation state.

use crate::{Message, Role};

/// The ordered message list of one turn.
///
/// The system message is always first and the caller's history is kept in
/// its original order; within a turn messages are only ever appended.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create a conversation from a system message and caller history.
    pub fn new(system: Message, history: Vec<Message>) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(system);
        messages.extend(history);
        Self { messages }
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append several messages in order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// All messages, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the most recent user message, if it has any text.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .filter(|c| !c.is_empty())
    }
}
