//! Incremental stream events.
//!
//! On the wire every event is one JSON object with a `type` discriminator and
//! a `data` payload:
//!
//! ```text
//! {"type":"session","data":{"sessionId":"s1","recommendations":[]}}
//! {"type":"token","data":{"delta":"Hi"}}
//! {"type":"complete","data":{"sessionId":"s1","reply":{...},"resolvedLocale":"en"}}
//! {"type":"error","data":{"code":"chat_tokens_exhausted","detail":"..."}}
//! ```
//!
//! The set is closed. Anything else is a protocol violation and is turned into
//! an [`StreamEvent::Error`] carrying [`PROTOCOL_DECODE_ERROR_CODE`] by the
//! decoder in `solace-turn`.

use serde::{Deserialize, Serialize};

use crate::id::SessionId;
use crate::message::{MemoryHighlight, Recommendation, TranscriptMessage};

/// Error code the backend uses when the account has no turns left.
pub const QUOTA_ERROR_CODE: &str = "chat_tokens_exhausted";

/// Error code of the synthetic event emitted for undecodable frames.
pub const PROTOCOL_DECODE_ERROR_CODE: &str = "protocol_decode_error";

/// One event of the incremental stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Session identity and side payloads, sent before or between tokens.
    Session(SessionPayload),
    /// A fragment of the assistant reply.
    Token(TokenPayload),
    /// The authoritative end of the turn.
    Complete(CompletePayload),
    /// The backend (or the decoder) gave up on the stream.
    Error(ErrorPayload),
}

impl StreamEvent {
    /// Shorthand for a token event.
    pub fn token(delta: impl Into<String>) -> Self {
        Self::Token(TokenPayload {
            delta: delta.into(),
        })
    }

    /// Shorthand for an error event.
    pub fn error(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code: code.into(),
            detail: detail.into(),
        })
    }

    /// The synthetic event used for frames that could not be decoded.
    pub fn protocol_error(detail: impl Into<String>) -> Self {
        Self::error(PROTOCOL_DECODE_ERROR_CODE, detail)
    }

    /// Wire name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Token(_) => "token",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }
}

/// Payload of a `session` event.
///
/// Absent lists mean "unchanged"; present lists replace what the caller
/// currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Session the turn belongs to.
    pub session_id: SessionId,
    /// Recommendations for the session so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    /// Memory highlights for the session so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_highlights: Option<Vec<MemoryHighlight>>,
    /// Locale the backend decided to answer in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_locale: Option<String>,
}

/// Payload of a `token` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Text to append to the in-flight reply.
    #[serde(alias = "content")]
    pub delta: String,
}

/// Payload of a `complete` event, and the body of the non-incremental reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    /// Session the turn belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// The final assistant message.
    pub reply: TranscriptMessage,
    /// Final recommendations for the session.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Final memory highlights for the session.
    #[serde(default)]
    pub memory_highlights: Vec<MemoryHighlight>,
    /// Locale the reply was produced in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_locale: Option<String>,
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Machine-readable code, e.g. [`QUOTA_ERROR_CODE`].
    pub code: String,
    /// Human-readable explanation.
    #[serde(default, alias = "message")]
    pub detail: String,
}

impl ErrorPayload {
    /// Whether the backend signalled quota exhaustion.
    pub fn is_quota(&self) -> bool {
        self.code == QUOTA_ERROR_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_event_parses_with_optional_fields_missing() {
        let ev: StreamEvent =
            serde_json::from_value(json!({"type": "session", "data": {"sessionId": "s1"}}))
                .unwrap();
        match ev {
            StreamEvent::Session(p) => {
                assert_eq!(p.session_id.as_str(), "s1");
                assert!(p.recommendations.is_none());
                assert!(p.memory_highlights.is_none());
                assert!(p.resolved_locale.is_none());
            }
            other => panic!("expected session, got {other:?}"),
        }
    }

    #[test]
    fn token_event_parses_delta() {
        let ev: StreamEvent =
            serde_json::from_value(json!({"type": "token", "data": {"delta": "Hi"}})).unwrap();
        assert_eq!(ev, StreamEvent::token("Hi"));
    }

    #[test]
    fn complete_event_parses_reply() {
        let ev: StreamEvent = serde_json::from_value(json!({
            "type": "complete",
            "data": {
                "sessionId": "s1",
                "reply": {
                    "id": "a-1",
                    "role": "assistant",
                    "content": "Hi there",
                    "createdAt": "2026-01-02T03:04:05Z"
                },
                "recommendations": [{"title": "walk"}],
                "memoryHighlights": [],
                "resolvedLocale": "en"
            }
        }))
        .unwrap();
        let StreamEvent::Complete(p) = ev else {
            panic!("expected complete");
        };
        assert_eq!(p.reply.content, "Hi there");
        assert_eq!(p.recommendations.len(), 1);
        assert_eq!(p.resolved_locale.as_deref(), Some("en"));
    }

    #[test]
    fn error_event_detects_quota_code() {
        let ev: StreamEvent = serde_json::from_value(json!({
            "type": "error",
            "data": {"code": "chat_tokens_exhausted", "detail": "Out of tokens"}
        }))
        .unwrap();
        let StreamEvent::Error(p) = ev else {
            panic!("expected error");
        };
        assert!(p.is_quota());
        assert_eq!(p.detail, "Out of tokens");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let res: Result<StreamEvent, _> =
            serde_json::from_value(json!({"type": "ping", "data": {}}));
        assert!(res.is_err());
    }

    #[test]
    fn kind_matches_wire_name() {
        assert_eq!(StreamEvent::token("x").kind(), "token");
        assert_eq!(StreamEvent::protocol_error("bad").kind(), "error");
    }
}
