//! Transcript messages and the opaque payloads that ride alongside them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::MessageId;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the app.
    User,
    /// The conversational backend.
    Assistant,
}

/// One entry of the conversation transcript.
///
/// `streaming` is true only for the assistant entry that is still receiving
/// token deltas. At most one such entry exists in a [`SessionState`] at any
/// time.
///
/// [`SessionState`]: crate::state::SessionState
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Text content. Grows while `streaming` is true.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Whether the entry is still being appended to.
    #[serde(default)]
    pub streaming: bool,
}

impl TranscriptMessage {
    /// A finished user message.
    pub fn user(id: MessageId, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            created_at,
            streaming: false,
        }
    }

    /// An empty assistant entry that will receive token deltas.
    pub fn assistant_placeholder(id: MessageId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            created_at,
            streaming: true,
        }
    }
}

/// A recommendation attached to a turn by the backend.
///
/// The controller never looks inside; the payload is carried as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendation(pub serde_json::Value);

/// A memory highlight surfaced by the backend for the current session.
///
/// Opaque to the controller, like [`Recommendation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryHighlight(pub serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_without_streaming_flag_defaults_to_false() {
        let msg: TranscriptMessage = serde_json::from_value(json!({
            "id": "a-1",
            "role": "assistant",
            "content": "Hi there",
            "createdAt": "2026-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(!msg.streaming);
        assert_eq!(msg.content, "Hi there");
    }

    #[test]
    fn placeholder_starts_empty_and_streaming() {
        let msg = TranscriptMessage::assistant_placeholder(MessageId::new("a"), Utc::now());
        assert!(msg.streaming);
        assert!(msg.content.is_empty());
    }

    #[test]
    fn recommendation_keeps_payload_verbatim() {
        let raw = json!({"kind": "exercise", "title": "Box breathing", "extra": [1, 2]});
        let rec: Recommendation = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
    }
}
