//! UI-agnostic chat state
//!
//! The transcript is shared between whatever front end drives it (the TUI
//! today) and the streaming reducer in [`crate::conversation`]. It never
//! hands out mutable access to its turns: the only way to change a reply is
//! through the [`ReplySlot`] returned when the exchange was opened.

use serde::{Deserialize, Serialize};

/// Seed turn shown before the user has typed anything.
pub const GREETING: &str =
    "Cheers! I am RAG-on-Tap. Ask me anything about recipes, brewing styles, or ingredients!";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Handle to the assistant turn that is still being written.
///
/// Not `Clone`: whoever finishes the stream consumes it, so a reply cannot be
/// touched again once its stream has terminated.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplySlot {
    index: usize,
    generation: u64,
}

impl ReplySlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Ordered chat history, oldest first.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: Vec<ChatMessage>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            turns: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the greeting is never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a user turn and its (empty) paired assistant turn.
    pub fn push_exchange(&mut self, user_text: impl Into<String>, generation: u64) -> ReplySlot {
        self.turns.push(ChatMessage::user(user_text));
        self.turns.push(ChatMessage::assistant(String::new()));
        ReplySlot {
            index: self.turns.len() - 1,
            generation,
        }
    }

    /// Replace the content of the reply named by `slot`.
    pub fn set_reply(&mut self, slot: &ReplySlot, text: impl Into<String>) {
        if let Some(turn) = self.turns.get_mut(slot.index) {
            debug_assert_eq!(turn.role, ChatRole::Assistant);
            turn.content = text.into();
        }
    }

    pub fn reply(&self, slot: &ReplySlot) -> Option<&str> {
        self.turns.get(slot.index).map(|turn| turn.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_single_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0], ChatMessage::assistant(GREETING));
    }

    #[test]
    fn exchange_appends_user_then_empty_reply() {
        let mut transcript = Transcript::new();
        let slot = transcript.push_exchange("Best hops for a NEIPA?", 1);

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turns()[1], ChatMessage::user("Best hops for a NEIPA?"));
        assert_eq!(transcript.turns()[2], ChatMessage::assistant(""));
        assert_eq!(slot.index(), 2);
        assert_eq!(slot.generation(), 1);
    }

    #[test]
    fn set_reply_replaces_only_the_slot() {
        let mut transcript = Transcript::new();
        let first = transcript.push_exchange("one", 1);
        transcript.set_reply(&first, "first answer");
        let second = transcript.push_exchange("two", 2);
        transcript.set_reply(&second, "partial");
        transcript.set_reply(&second, "partial and more");

        assert_eq!(transcript.reply(&first), Some("first answer"));
        assert_eq!(transcript.reply(&second), Some("partial and more"));
        assert_eq!(transcript.turns()[3].content, "two");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
