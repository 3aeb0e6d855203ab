//! Session event types

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Events emitted whenever controller state changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was appended to the conversation
    MessageAppended { message: Message },

    /// A message was updated in place
    MessageUpdated { message: Message },

    /// The typing indicator changed
    TypingChanged { is_typing: bool },

    /// The error banner changed
    ErrorChanged { error: Option<String> },

    /// The conversation was emptied
    ConversationCleared,
}

impl SessionEvent {
    /// Check if this event resolves an assistant turn
    pub fn is_turn_end(&self) -> bool {
        matches!(
            self,
            SessionEvent::MessageUpdated { message } if message.status.is_terminal()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Status;

    #[test]
    fn test_turn_end_detection() {
        let mut msg = Message::placeholder();
        assert!(!SessionEvent::MessageUpdated { message: msg.clone() }.is_turn_end());

        msg.status = Status::Done;
        assert!(SessionEvent::MessageUpdated { message: msg.clone() }.is_turn_end());
        assert!(!SessionEvent::MessageAppended { message: msg }.is_turn_end());
    }

    #[test]
    fn test_event_tagging() {
        let json = serde_json::to_value(SessionEvent::TypingChanged { is_typing: true }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "typing_changed", "is_typing": true}));
    }
}
