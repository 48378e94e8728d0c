//! The request sent for one turn and the non-incremental reply.

use serde::{Deserialize, Serialize};

use crate::event::CompletePayload;
use crate::id::{SessionId, UserId};

/// What the backend needs to produce one assistant reply.
///
/// Built once per turn; the incremental attempt and the fallback attempt send
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Account sending the message.
    pub user_id: UserId,
    /// Conversation to continue. Absent on the first turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// The user's message. Never empty.
    pub message: String,
    /// Locale the user is writing in.
    pub locale: String,
}

impl TurnRequest {
    /// Assemble a request.
    pub fn new(
        user_id: UserId,
        session_id: Option<SessionId>,
        message: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            session_id,
            message: message.into(),
            locale: locale.into(),
        }
    }
}

/// Body of the non-incremental endpoint. Same shape as a `complete` event.
pub type TurnResponse = CompletePayload;
