//! Deterministic doubles for testing controllers and transports.
//!
//! Available behind the `test-utils` feature flag.

mod fixed;
mod scripted_transport;
pub mod wire;

pub use fixed::{FixedClock, SequentialIds};
pub use scripted_transport::{ReplyScript, ScriptedTransport, StreamScript};
