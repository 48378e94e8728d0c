//! The contract between the turn controller and a backend client.
//!
//! [`TurnTransport`] uses RPITIT (return-position `impl Trait` in traits) and
//! is not object-safe. The controller is generic over it instead.

use std::future::Future;
use std::pin::Pin;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::request::{TurnRequest, TurnResponse};

/// Raw frames of an incremental response, one protocol event per item.
///
/// A transport ends the stream after yielding an `Err`. When the cancellation
/// token passed to [`TurnTransport::open_stream`] fires, the stream ends
/// without an error.
pub struct FrameStream {
    /// The frames. Consume with `StreamExt::next()`.
    pub receiver: Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>,
}

impl FrameStream {
    /// Wrap any frame stream.
    pub fn new(
        stream: impl Stream<Item = Result<String, TransportError>> + Send + 'static,
    ) -> Self {
        Self {
            receiver: Box::pin(stream),
        }
    }
}

impl std::fmt::Debug for FrameStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream").finish_non_exhaustive()
    }
}

/// Stateless network operations for one conversational backend.
///
/// Implementations do not retry and do not keep session state. Both calls
/// must stop promptly once `cancel` fires.
pub trait TurnTransport: Send + Sync {
    /// Open the incremental endpoint for `request`.
    fn open_stream(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<FrameStream, TransportError>> + Send;

    /// Run the whole turn in a single non-incremental call.
    fn send_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<TurnResponse, TransportError>> + Send;
}
