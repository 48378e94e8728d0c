//! # solace-types — the vocabulary of a chat turn
//!
//! Shared types for the Solace chat-turn controller and its transports.
//!
//! | Module | What it holds |
//! |--------|---------------|
//! | [`id`] | Typed string identifiers for users, sessions and messages |
//! | [`message`] | Transcript messages and opaque server payloads |
//! | [`event`] | The closed set of incremental stream events |
//! | [`request`] | The request sent for a turn and the non-incremental reply |
//! | [`state`] | The session state published to callers |
//! | [`error`] | Transport errors and the turn error taxonomy |
//! | [`transport`] | The [`TurnTransport`] trait a backend client implements |
//! | [`provider`] | Injectable ID and clock providers |
//!
//! The controller itself lives in `solace-turn`; an HTTP transport lives in
//! `solace-transport-http`.

#![deny(missing_docs)]

pub mod error;
pub mod event;
pub mod id;
pub mod message;
pub mod provider;
pub mod request;
pub mod state;
pub mod transport;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::{TransportError, TurnError};
pub use event::{
    CompletePayload, ErrorPayload, PROTOCOL_DECODE_ERROR_CODE, QUOTA_ERROR_CODE, SessionPayload,
    StreamEvent, TokenPayload,
};
pub use id::{MessageId, SessionId, UserId};
pub use message::{MemoryHighlight, Recommendation, Role, TranscriptMessage};
pub use provider::{Clock, IdProvider, SystemClock, UuidIds};
pub use request::{TurnRequest, TurnResponse};
pub use state::SessionState;
pub use transport::{FrameStream, TurnTransport};
