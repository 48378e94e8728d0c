//! # solace-turn — one chat turn, start to finish
//!
//! [`TurnController`] sends a user message through a
//! [`TurnTransport`](solace_types::TurnTransport), folds the incremental
//! events into a [`SessionState`](solace_types::SessionState), retries once
//! without streaming when the stream ends inconclusively, and publishes every
//! change through a `tokio::sync::watch` channel.
//!
//! # Usage
//!
//! ```ignore
//! use solace_transport_http::HttpTransport;
//! use solace_turn::{TurnConfig, TurnController, TurnOutcome};
//!
//! let transport = HttpTransport::new("https://api.example.com");
//! let controller = TurnController::new(transport, TurnConfig::default());
//! if let TurnOutcome::Completed { .. } = controller.run_turn("How did I sleep this week?").await? {
//!     if let Some(reply) = controller.state().messages.last() {
//!         println!("{}", reply.content);
//!     }
//! }
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | The turn state machine |
//! | [`decoder`] | Frame-to-event decoding |
//! | [`classify`] | Failure classification |
//! | [`fallback`] | One-shot non-incremental retry |
//! | [`config`] | Controller configuration |

#![deny(missing_docs)]

pub mod classify;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod fallback;

pub use classify::ErrorClassifier;
pub use config::{DEFAULT_QUOTA_MESSAGE, TurnConfig};
pub use controller::{
    ControllerError, Finalize, TurnController, TurnControllerBuilder, TurnOutcome, TurnPhase,
};
pub use decoder::{decode_events, decode_frame};
pub use fallback::{FallbackDecision, FallbackOrchestrator, SkipReason};
