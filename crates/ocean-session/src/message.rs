//! Conversation message types

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Content written into a placeholder when its turn is stopped
pub const STOPPED_CONTENT: &str = "Stopped.";

/// Content written into a placeholder when its turn fails
pub const ERROR_CONTENT: &str = "Error generating response. Please Retry.";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Lifecycle marker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A user message that was submitted
    Sent,
    /// An assistant placeholder awaiting its reply
    Streaming,
    /// An assistant reply that arrived
    Done,
    /// An assistant turn that failed
    Error,
    /// An assistant turn that was stopped
    Canceled,
    /// A system notice
    Info,
}

impl Status {
    /// Whether an assistant turn with this status has been resolved
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Error | Status::Canceled)
    }
}

/// A single chat message, persisted as `{id, role, content, status}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub status: Status,
}

impl Message {
    /// A submitted user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            role: Role::User,
            content: content.into(),
            status: Status::Sent,
        }
    }

    /// An empty assistant placeholder for a pending turn
    pub fn placeholder() -> Self {
        Self {
            id: next_id(),
            role: Role::Assistant,
            content: String::new(),
            status: Status::Streaming,
        }
    }

    /// A system notice
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            role: Role::System,
            content: content.into(),
            status: Status::Info,
        }
    }

    /// Whether this is an assistant placeholder still awaiting a reply
    pub fn is_pending(&self) -> bool {
        self.role == Role::Assistant && self.status == Status::Streaming
    }
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh message id.
///
/// Ids sort by creation time and sequence within a process; the random tail
/// keeps them unique across restarts.
pub fn next_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let tail = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{:06}_{}", millis, seq, &tail[..8])
}

/// Find the most recent user message
pub fn last_user_message(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == Role::User)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_constructors() {
        let user = Message::user("hi");
        assert_eq!((user.role, user.status), (Role::User, Status::Sent));

        let pending = Message::placeholder();
        assert!(pending.is_pending());
        assert!(pending.content.is_empty());

        let notice = Message::system("welcome");
        assert_eq!((notice.role, notice.status), (Role::System, Status::Info));
        assert!(!notice.is_pending());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(Status::Done.is_terminal());
        assert!(Status::Error.is_terminal());
        assert!(Status::Canceled.is_terminal());
        assert!(!Status::Streaming.is_terminal());
        assert!(!Status::Sent.is_terminal());
    }

    #[test]
    fn test_wire_format() {
        let msg = Message {
            id: "1_a".into(),
            role: Role::Assistant,
            content: "hello".into(),
            status: Status::Canceled,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1_a",
                "role": "assistant",
                "content": "hello",
                "status": "canceled"
            })
        );
        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_last_user_message() {
        let msgs = vec![
            Message::system("s"),
            Message::user("first"),
            Message::placeholder(),
            Message::user("second"),
            Message::placeholder(),
        ];
        assert_eq!(last_user_message(&msgs).unwrap().content, "second");
        assert!(last_user_message(&msgs[..1]).is_none());
    }
}
