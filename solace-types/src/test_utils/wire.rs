//! Builders for wire frames and replies.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::event::{CompletePayload, QUOTA_ERROR_CODE};
use crate::id::{MessageId, SessionId};
use crate::message::{Role, TranscriptMessage};

/// `{"type":"session",...}` with only the session ID.
pub fn session_frame(session_id: &str) -> String {
    json!({"type": "session", "data": {"sessionId": session_id}}).to_string()
}

/// `{"type":"token",...}`.
pub fn token_frame(delta: &str) -> String {
    json!({"type": "token", "data": {"delta": delta}}).to_string()
}

/// `{"type":"complete",...}` with an assistant reply and empty side payloads.
pub fn complete_frame(session_id: &str, reply_id: &str, content: &str) -> String {
    json!({
        "type": "complete",
        "data": {
            "sessionId": session_id,
            "reply": {
                "id": reply_id,
                "role": "assistant",
                "content": content,
                "createdAt": "2026-01-01T00:00:00Z"
            },
            "recommendations": [],
            "memoryHighlights": [],
            "resolvedLocale": "en"
        }
    })
    .to_string()
}

/// `{"type":"error",...}`.
pub fn error_frame(code: &str, detail: &str) -> String {
    json!({"type": "error", "data": {"code": code, "detail": detail}}).to_string()
}

/// The quota error frame.
pub fn quota_frame(detail: &str) -> String {
    error_frame(QUOTA_ERROR_CODE, detail)
}

/// A non-incremental reply.
pub fn reply(session_id: &str, reply_id: &str, content: &str) -> CompletePayload {
    CompletePayload {
        session_id: Some(SessionId::new(session_id)),
        reply: TranscriptMessage {
            id: MessageId::new(reply_id),
            role: Role::Assistant,
            content: content.to_string(),
            created_at: DateTime::<Utc>::default(),
            streaming: false,
        },
        recommendations: Vec::new(),
        memory_highlights: Vec::new(),
        resolved_locale: Some("en".into()),
    }
}
