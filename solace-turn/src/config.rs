//! Configuration for TurnController.

use solace_types::UserId;

/// Text shown when the backend reports quota exhaustion without a message.
pub const DEFAULT_QUOTA_MESSAGE: &str = "You have used all of your chat tokens.";

/// Static configuration for a TurnController instance.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Account the controller sends turns for.
    pub user_id: UserId,

    /// Locale sent with every request.
    pub locale: String,

    /// Whether an inconclusive stream is retried once without streaming.
    pub fallback_enabled: bool,

    /// Text used for quota errors that carry no detail of their own.
    pub quota_message: String,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            user_id: UserId::new("anonymous"),
            locale: "en".into(),
            fallback_enabled: true,
            quota_message: DEFAULT_QUOTA_MESSAGE.into(),
        }
    }
}
