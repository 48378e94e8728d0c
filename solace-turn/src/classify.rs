//! Error classification.
//!
//! Every way a turn can fail ends up as one [`TurnError`]. The rules:
//!
//! | Observation | Class |
//! |-------------|-------|
//! | anything after the turn's token fired | `UserCancelled` |
//! | HTTP 402, or a body/event whose code is the quota sentinel | `QuotaExceeded` |
//! | `protocol_decode_error` event, undecodable body | `ProtocolDecode` |
//! | other non-2xx status, other `error` event | `Server` |
//! | no response at all | `Network` |

use solace_types::{
    ErrorPayload, PROTOCOL_DECODE_ERROR_CODE, QUOTA_ERROR_CODE, TransportError, TurnError,
};

/// Maps transport failures and stream error events to [`TurnError`].
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    quota_message: String,
}

impl ErrorClassifier {
    /// A classifier that uses `quota_message` when a quota signal carries no
    /// text of its own.
    pub fn new(quota_message: impl Into<String>) -> Self {
        Self {
            quota_message: quota_message.into(),
        }
    }

    /// Classify a transport failure. `cancelled` is the state of the turn's
    /// token when the failure was observed.
    pub fn transport(&self, err: &TransportError, cancelled: bool) -> TurnError {
        if cancelled {
            return TurnError::UserCancelled;
        }
        match err {
            TransportError::Cancelled => TurnError::UserCancelled,
            TransportError::Status { status, body } => self.status(*status, body),
            TransportError::Network(detail) => TurnError::Network(detail.clone()),
            TransportError::Decode(detail) => TurnError::ProtocolDecode(detail.clone()),
            other => TurnError::Network(other.to_string()),
        }
    }

    /// Classify a non-success HTTP response.
    pub fn status(&self, status: u16, body: &str) -> TurnError {
        let detail = extract_detail(body);
        if status == 402 || body_signals_quota(body) {
            return TurnError::QuotaExceeded(detail.unwrap_or_else(|| self.quota_message.clone()));
        }
        let detail = detail.unwrap_or_else(|| format!("HTTP {status}"));
        TurnError::Server(detail)
    }

    /// Classify an `error` event from the stream.
    pub fn event(&self, payload: &ErrorPayload) -> TurnError {
        let detail = if payload.detail.is_empty() {
            None
        } else {
            Some(payload.detail.clone())
        };
        if payload.is_quota() {
            return TurnError::QuotaExceeded(detail.unwrap_or_else(|| self.quota_message.clone()));
        }
        let detail = detail.unwrap_or_else(|| payload.code.clone());
        if payload.code == PROTOCOL_DECODE_ERROR_CODE {
            TurnError::ProtocolDecode(detail)
        } else {
            TurnError::Server(detail)
        }
    }

    /// Classify a stream that ended without a `complete` event.
    pub fn stream_closed(&self, cancelled: bool) -> TurnError {
        if cancelled {
            TurnError::UserCancelled
        } else {
            TurnError::Network("stream closed before the reply completed".into())
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// JSON bodies are searched for `detail`, `message`, `error` (string) or
/// `error.message`; anything else is used verbatim. Blank bodies give `None`.
fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| json[*key].as_str())
        .or_else(|| json["error"]["message"].as_str())
        .map(str::to_string)
        .or_else(|| Some(trimmed.to_string()))
}

/// Whether a JSON error body carries the quota sentinel as its code.
fn body_signals_quota(body: &str) -> bool {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body.trim()) else {
        return false;
    };
    [&json["code"], &json["error"], &json["error"]["code"]]
        .iter()
        .any(|v| v.as_str() == Some(QUOTA_ERROR_CODE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ErrorClassifier {
        ErrorClassifier::new("out of tokens")
    }

    #[test]
    fn payment_required_is_quota_with_body_detail() {
        let err = classifier().status(402, r#"{"detail":"Upgrade to keep chatting"}"#);
        assert_eq!(err, TurnError::QuotaExceeded("Upgrade to keep chatting".into()));
    }

    #[test]
    fn payment_required_with_empty_body_uses_configured_text() {
        let err = classifier().status(402, "");
        assert_eq!(err, TurnError::QuotaExceeded("out of tokens".into()));
    }

    #[test]
    fn quota_code_in_body_wins_over_status() {
        let err = classifier().status(
            429,
            r#"{"code":"chat_tokens_exhausted","message":"No tokens"}"#,
        );
        assert_eq!(err, TurnError::QuotaExceeded("No tokens".into()));

        let nested = classifier().status(
            400,
            r#"{"error":{"code":"chat_tokens_exhausted","message":"Nested"}}"#,
        );
        assert_eq!(nested, TurnError::QuotaExceeded("Nested".into()));
    }

    #[test]
    fn server_failure_keeps_plain_body() {
        let err = classifier().status(500, "boom");
        assert_eq!(err, TurnError::Server("boom".into()));
        assert!(err.is_transient());
    }

    #[test]
    fn server_failure_without_body_names_status() {
        assert_eq!(classifier().status(503, "  "), TurnError::Server("HTTP 503".into()));
    }

    #[test]
    fn transport_errors_map_to_classes() {
        let c = classifier();
        assert_eq!(
            c.transport(&TransportError::Network("reset".into()), false),
            TurnError::Network("reset".into())
        );
        assert_eq!(
            c.transport(&TransportError::Decode("bad".into()), false),
            TurnError::ProtocolDecode("bad".into())
        );
        assert_eq!(
            c.transport(&TransportError::Cancelled, false),
            TurnError::UserCancelled
        );
    }

    #[test]
    fn anything_after_cancellation_is_user_cancelled() {
        let err = classifier().transport(
            &TransportError::Status {
                status: 402,
                body: String::new(),
            },
            true,
        );
        assert_eq!(err, TurnError::UserCancelled);
        assert_eq!(classifier().stream_closed(true), TurnError::UserCancelled);
    }

    #[test]
    fn stream_events_classify_by_code() {
        let c = classifier();
        let quota = ErrorPayload {
            code: QUOTA_ERROR_CODE.into(),
            detail: "Come back tomorrow".into(),
        };
        assert_eq!(c.event(&quota), TurnError::QuotaExceeded("Come back tomorrow".into()));

        let decode = ErrorPayload {
            code: PROTOCOL_DECODE_ERROR_CODE.into(),
            detail: "bad frame".into(),
        };
        assert_eq!(c.event(&decode), TurnError::ProtocolDecode("bad frame".into()));

        let other = ErrorPayload {
            code: "llm_timeout".into(),
            detail: String::new(),
        };
        assert_eq!(c.event(&other), TurnError::Server("llm_timeout".into()));
    }

    #[test]
    fn stream_closed_early_is_transient() {
        assert!(classifier().stream_closed(false).is_transient());
    }
}
