//! Session state published by the turn controller.

use serde::{Deserialize, Serialize};

use crate::event::{CompletePayload, SessionPayload};
use crate::id::{MessageId, SessionId};
use crate::message::{MemoryHighlight, Recommendation, TranscriptMessage};

/// Everything a caller needs to render the conversation.
///
/// Only the controller mutates this. Callers receive clones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Transcript in display order.
    pub messages: Vec<TranscriptMessage>,
    /// Latest recommendations from the backend.
    pub recommendations: Vec<Recommendation>,
    /// Latest memory highlights from the backend.
    pub memory_highlights: Vec<MemoryHighlight>,
    /// Latest known session identifier.
    pub session_id: Option<SessionId>,
    /// Whether a turn is in flight.
    pub is_streaming: bool,
    /// User-visible error from the last turn, if any.
    pub error: Option<String>,
    /// Locale the backend last answered in.
    pub resolved_locale: Option<String>,
    /// Sticky flag raised when the account ran out of turns.
    pub quota_exceeded: bool,
}

impl SessionState {
    /// Find a transcript entry by ID.
    pub fn message(&self, id: &MessageId) -> Option<&TranscriptMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Find a transcript entry by ID, mutably.
    pub fn message_mut(&mut self, id: &MessageId) -> Option<&mut TranscriptMessage> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Remove a transcript entry. Returns whether anything was removed.
    pub fn remove_message(&mut self, id: &MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| &m.id != id);
        self.messages.len() != before
    }

    /// The assistant entry still receiving deltas, if any.
    pub fn streaming_message(&self) -> Option<&TranscriptMessage> {
        self.messages.iter().find(|m| m.streaming)
    }

    /// Record a session ID unless it is empty. A known ID is never cleared.
    pub fn adopt_session_id(&mut self, id: Option<&SessionId>) {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.session_id = Some(id.clone());
        }
    }

    /// Fold a `session` event in. The transcript is untouched.
    pub fn merge_session(&mut self, payload: &SessionPayload) {
        self.adopt_session_id(Some(&payload.session_id));
        if let Some(recommendations) = &payload.recommendations {
            self.recommendations = recommendations.clone();
        }
        if let Some(highlights) = &payload.memory_highlights {
            self.memory_highlights = highlights.clone();
        }
        if let Some(locale) = &payload.resolved_locale {
            self.resolved_locale = Some(locale.clone());
        }
    }

    /// Fold the session-level fields of a final reply in.
    ///
    /// The transcript is handled by the caller, which knows which entry the
    /// reply replaces.
    pub fn merge_completion(&mut self, payload: &CompletePayload) {
        self.adopt_session_id(payload.session_id.as_ref());
        self.recommendations = payload.recommendations.clone();
        self.memory_highlights = payload.memory_highlights.clone();
        if let Some(locale) = &payload.resolved_locale {
            self.resolved_locale = Some(locale.clone());
        }
    }

    /// Clear the stale streaming markers left behind by an interrupted
    /// process, e.g. when restoring a persisted state.
    pub fn settle(&mut self) {
        self.is_streaming = false;
        self.messages.retain(|m| !(m.streaming && m.content.is_empty()));
        for message in &mut self.messages {
            message.streaming = false;
        }
    }
}
