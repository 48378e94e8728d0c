//! ScriptedTransport — a TurnTransport that replays canned responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use futures::stream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::request::{TurnRequest, TurnResponse};
use crate::transport::{FrameStream, TurnTransport};

/// How one `open_stream` call behaves.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Open successfully and yield `frames` in order.
    Frames {
        /// Items to yield.
        frames: Vec<Result<String, TransportError>>,
        /// Keep the stream open after the last frame until cancelled.
        hang: bool,
    },
    /// Fail to open.
    OpenError(TransportError),
    /// Never open; resolves to `Cancelled` once the token fires.
    OpenHang,
}

/// How one `send_turn` call behaves.
#[derive(Debug, Clone)]
pub enum ReplyScript {
    /// Resolve immediately.
    Reply(Result<TurnResponse, TransportError>),
    /// Never resolve; returns `Cancelled` once the token fires.
    Hang,
}

/// Replays scripted streams and replies in FIFO order and records every
/// request it sees.
///
/// When a queue runs dry the call fails with a network error, so a test that
/// forgets to script a fallback sees a failure rather than a hang.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    streams: Mutex<VecDeque<StreamScript>>,
    replies: Mutex<VecDeque<ReplyScript>>,
    requests: Mutex<Vec<TurnRequest>>,
    stream_calls: AtomicUsize,
    turn_calls: AtomicUsize,
}

impl ScriptedTransport {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a stream that yields `frames` and closes.
    pub fn stream<S: Into<String>>(self, frames: impl IntoIterator<Item = S>) -> Self {
        self.push_stream(StreamScript::Frames {
            frames: frames.into_iter().map(|f| Ok(f.into())).collect(),
            hang: false,
        })
    }

    /// Queue a stream that yields `frames` and then stays open.
    pub fn stream_then_hang<S: Into<String>>(self, frames: impl IntoIterator<Item = S>) -> Self {
        self.push_stream(StreamScript::Frames {
            frames: frames.into_iter().map(|f| Ok(f.into())).collect(),
            hang: true,
        })
    }

    /// Queue a stream that yields `frames` and then fails with `error`.
    pub fn stream_failing<S: Into<String>>(
        self,
        frames: impl IntoIterator<Item = S>,
        error: TransportError,
    ) -> Self {
        let mut items: Vec<_> = frames.into_iter().map(|f| Ok(f.into())).collect();
        items.push(Err(error));
        self.push_stream(StreamScript::Frames {
            frames: items,
            hang: false,
        })
    }

    /// Queue a stream that cannot be opened.
    pub fn open_error(self, error: TransportError) -> Self {
        self.push_stream(StreamScript::OpenError(error))
    }

    /// Queue a stream whose opening never completes.
    pub fn open_hang(self) -> Self {
        self.push_stream(StreamScript::OpenHang)
    }

    /// Queue a successful non-incremental reply.
    pub fn reply(self, response: TurnResponse) -> Self {
        self.push_reply(ReplyScript::Reply(Ok(response)))
    }

    /// Queue a failed non-incremental reply.
    pub fn reply_error(self, error: TransportError) -> Self {
        self.push_reply(ReplyScript::Reply(Err(error)))
    }

    /// Queue a non-incremental call that never completes.
    pub fn reply_hang(self) -> Self {
        self.push_reply(ReplyScript::Hang)
    }

    /// Number of `open_stream` calls so far.
    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Number of `send_turn` calls so far.
    pub fn turn_calls(&self) -> usize {
        self.turn_calls.load(Ordering::SeqCst)
    }

    /// Every request received, in call order, across both operations.
    pub async fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().await.clone()
    }

    fn push_stream(mut self, script: StreamScript) -> Self {
        self.streams.get_mut().push_back(script);
        self
    }

    fn push_reply(mut self, script: ReplyScript) -> Self {
        self.replies.get_mut().push_back(script);
        self
    }
}

impl TurnTransport for ScriptedTransport {
    async fn open_stream(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<FrameStream, TransportError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        let script = self.streams.lock().await.pop_front();

        match script {
            Some(StreamScript::Frames { frames, hang }) => {
                let tail = if hang {
                    stream::pending().boxed()
                } else {
                    stream::empty().boxed()
                };
                let frames = stream::iter(frames)
                    .chain(tail)
                    .take_until(cancel.cancelled_owned());
                Ok(FrameStream::new(frames))
            }
            Some(StreamScript::OpenError(error)) => Err(error),
            Some(StreamScript::OpenHang) => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
            None => Err(TransportError::Network("no scripted stream".into())),
        }
    }

    async fn send_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<TurnResponse, TransportError> {
        self.turn_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        let script = self.replies.lock().await.pop_front();

        match script {
            Some(ReplyScript::Reply(result)) => result,
            Some(ReplyScript::Hang) => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
            None => Err(TransportError::Network("no scripted reply".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::UserId;
    use crate::test_utils::wire;

    fn request() -> TurnRequest {
        TurnRequest::new(UserId::new("u1"), None, "hello", "en")
    }

    #[tokio::test]
    async fn replays_frames_in_order() {
        let transport = ScriptedTransport::new().stream([wire::token_frame("a"), wire::token_frame("b")]);
        let frames = transport
            .open_stream(request(), CancellationToken::new())
            .await
            .unwrap();
        let items: Vec<_> = frames.receiver.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(transport.stream_calls(), 1);
        assert_eq!(transport.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn hanging_stream_ends_on_cancel() {
        let transport = ScriptedTransport::new().stream_then_hang([wire::token_frame("a")]);
        let cancel = CancellationToken::new();
        let mut frames = transport.open_stream(request(), cancel.clone()).await.unwrap();
        assert!(frames.receiver.next().await.is_some());
        cancel.cancel();
        assert!(frames.receiver.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_queue_fails_instead_of_hanging() {
        let transport = ScriptedTransport::new();
        let err = transport
            .send_turn(request(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(transport.turn_calls(), 1);
    }
}
