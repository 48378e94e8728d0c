#![deny(missing_docs)]
//! HTTP transport for the Solace chat-turn controller.
//!
//! Implements [`solace_types::TurnTransport`] against a backend that exposes
//! two endpoints:
//!
//! - an incremental endpoint answering with newline-delimited JSON events
//!   (default `POST /chat/stream`), and
//! - a non-incremental endpoint answering with one JSON reply
//!   (default `POST /chat`).
//!
//! The transport only frames bytes into lines; turning lines into typed
//! events is the decoder's job in `solace-turn`.

mod client;
mod error;
mod framing;

pub use client::HttpTransport;
