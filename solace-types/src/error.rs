//! Error types shared by transports and the turn controller.

use thiserror::Error;

/// Errors raised by a [`TurnTransport`](crate::TurnTransport).
///
/// These describe what happened on the wire. The controller's classifier
/// turns them into a [`TurnError`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// No usable response arrived (connection refused, reset, DNS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The call was aborted through its cancellation token.
    #[error("cancelled")]
    Cancelled,
}

/// Why a turn did not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The caller cancelled the turn, or a newer turn superseded it.
    /// Never shown to the user.
    #[error("cancelled")]
    UserCancelled,

    /// The account is out of turns. Carries the text to show.
    #[error("{0}")]
    QuotaExceeded(String),

    /// The backend answered with a failure.
    #[error("server error: {0}")]
    Server(String),

    /// The backend could not be reached, or the stream dropped.
    #[error("network error: {0}")]
    Network(String),

    /// A stream frame or reply body was malformed.
    #[error("protocol error: {0}")]
    ProtocolDecode(String),
}

impl TurnError {
    /// Whether a single non-incremental retry is worth attempting.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Server(_) | Self::Network(_) | Self::ProtocolDecode(_)
        )
    }

    /// Whether this is the account quota signal.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}
