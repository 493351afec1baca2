//! Chat transcript (volatile)

use super::{Durability, Store};
use crate::models::ChatMessage;

/// Ordered list of chat messages for the current process
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl Store for ChatTranscript {
    const DURABILITY: Durability = Durability::Volatile;
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Remove the most recent message
    pub fn delete_last(&mut self) -> Option<ChatMessage> {
        self.messages.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_transcript_order_and_delete_last() {
        let mut chat = ChatTranscript::new();
        chat.add_message(ChatMessage::user("hello", vec![]));
        chat.add_message(ChatMessage::assistant("hi there", vec![]));

        assert_eq!(chat.len(), 2);
        assert_eq!(chat.messages()[0].role, Role::User);

        let last = chat.delete_last().unwrap();
        assert_eq!(last.content, "hi there");
        assert_eq!(chat.len(), 1);

        chat.clear();
        assert!(chat.is_empty());
        assert!(chat.delete_last().is_none());
    }

    #[test]
    fn test_transcript_is_volatile() {
        assert_eq!(ChatTranscript::new().durability(), Durability::Volatile);
    }
}
