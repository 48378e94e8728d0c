//! The turn controller.
//!
//! [`TurnController`] owns the [`SessionState`] and drives one turn at a time:
//!
//! ```text
//! Idle ─send─▶ Sending ─first event─▶ Streaming ─complete─▶ Idle
//!                 │                       │
//!                 └────── inconclusive ───┴─▶ Finalizing(Fallback) ─▶ Idle
//! ```
//!
//! Starting a turn supersedes any turn in flight. A superseded or cancelled
//! turn never writes to the state again: every mutation first checks that the
//! turn is still the active one, under the same lock that supersede and
//! cancel take.

use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use solace_types::{
    Clock, CompletePayload, IdProvider, MessageId, SessionState, StreamEvent, SystemClock,
    TranscriptMessage, TurnError, TurnRequest, TurnTransport, UuidIds,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::classify::ErrorClassifier;
use crate::config::TurnConfig;
use crate::decoder::decode_events;
use crate::fallback::{FallbackDecision, FallbackOrchestrator};

/// Where the controller is in the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn in flight.
    Idle,
    /// Request issued, nothing received yet.
    Sending,
    /// Events are arriving.
    Streaming,
    /// The turn is being settled.
    Finalizing(Finalize),
}

/// How a turn is being settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalize {
    /// The reply is being committed.
    Success,
    /// The stream was inconclusive and the non-incremental request is out.
    Fallback,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A reply was committed to the transcript.
    Completed {
        /// Whether the reply came from the non-incremental fallback.
        via_fallback: bool,
    },
    /// The account is out of turns.
    QuotaExceeded,
    /// The turn failed. The error text is also in [`SessionState::error`].
    Failed(TurnError),
    /// The turn was cancelled or superseded and left no trace beyond the
    /// user message.
    Cancelled,
}

/// Errors returned to callers of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The message was empty after trimming whitespace.
    #[error("message is empty")]
    EmptyMessage,
}

/// Identity of the turn currently allowed to mutate state.
#[derive(Debug, Clone)]
struct ActiveTurn {
    id: u64,
    token: CancellationToken,
    placeholder: MessageId,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    active: Option<ActiveTurn>,
    phase: TurnPhase,
    turns_started: u64,
}

struct Shared<T> {
    transport: T,
    config: TurnConfig,
    classifier: ErrorClassifier,
    ids: Box<dyn IdProvider>,
    clock: Box<dyn Clock>,
    inner: Mutex<Inner>,
    published: watch::Sender<SessionState>,
}

/// Result of applying one stream event.
enum Step {
    Continue,
    Finished(TurnOutcome),
    Inconclusive(TurnError),
}

/// Drives chat turns against a [`TurnTransport`] and publishes the resulting
/// [`SessionState`].
///
/// Cloning is cheap and every clone drives the same session.
pub struct TurnController<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for TurnController<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for TurnController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TurnController`].
pub struct TurnControllerBuilder<T> {
    transport: T,
    config: TurnConfig,
    ids: Option<Box<dyn IdProvider>>,
    clock: Option<Box<dyn Clock>>,
    initial_state: SessionState,
}

impl<T: TurnTransport> TurnControllerBuilder<T> {
    /// Set the configuration.
    pub fn config(mut self, config: TurnConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the ID provider used for new transcript entries.
    pub fn ids(mut self, ids: impl IdProvider + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// Set the clock used for new transcript entries.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Start from a previously published state, e.g. one restored from disk.
    /// Leftover streaming markers are cleared.
    pub fn initial_state(mut self, state: SessionState) -> Self {
        self.initial_state = state;
        self
    }

    /// Build the controller.
    pub fn build(self) -> TurnController<T> {
        let mut state = self.initial_state;
        state.settle();
        let (published, _) = watch::channel(state.clone());
        TurnController {
            shared: Arc::new(Shared {
                transport: self.transport,
                classifier: ErrorClassifier::new(self.config.quota_message.clone()),
                config: self.config,
                ids: self.ids.unwrap_or_else(|| Box::new(UuidIds)),
                clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
                inner: Mutex::new(Inner {
                    state,
                    active: None,
                    phase: TurnPhase::Idle,
                    turns_started: 0,
                }),
                published,
            }),
        }
    }
}

impl<T: TurnTransport> TurnController<T> {
    /// Start building a controller over `transport`.
    pub fn builder(transport: T) -> TurnControllerBuilder<T> {
        TurnControllerBuilder {
            transport,
            config: TurnConfig::default(),
            ids: None,
            clock: None,
            initial_state: SessionState::default(),
        }
    }

    /// A controller with default IDs, clock and empty state.
    pub fn new(transport: T, config: TurnConfig) -> Self {
        Self::builder(transport).config(config).build()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.shared.published.borrow().clone()
    }

    /// Receive every published state from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.published.subscribe()
    }

    /// Current phase of the turn in flight.
    pub fn phase(&self) -> TurnPhase {
        self.lock().phase
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// The configuration the controller was built with.
    pub fn config(&self) -> &TurnConfig {
        &self.shared.config
    }

    /// Start a turn in the background.
    ///
    /// The user message and reply placeholder are appended before this
    /// returns, so calls made in sequence supersede each other in call order.
    /// Must be called within a Tokio runtime.
    pub fn send_message(
        &self,
        text: impl Into<String>,
    ) -> Result<JoinHandle<TurnOutcome>, ControllerError>
    where
        T: 'static,
    {
        let text = validate(text.into())?;
        let (turn, request) = self.begin(text);
        let controller = self.clone();
        Ok(tokio::spawn(async move {
            controller.drive(turn, request).await
        }))
    }

    /// Run a turn to completion.
    pub async fn run_turn(&self, text: impl Into<String>) -> Result<TurnOutcome, ControllerError> {
        let text = validate(text.into())?;
        let (turn, request) = self.begin(text);
        Ok(self.drive(turn, request).await)
    }

    /// Abort the turn in flight, if any.
    ///
    /// The placeholder is removed and the user message kept. No error is
    /// recorded.
    pub fn cancel_streaming(&self) {
        let mut inner = self.lock();
        if retire_active(&mut inner) {
            tracing::debug!("solace.turn.cancelled");
            self.publish(&inner);
        }
    }

    /// Cancel any turn in flight and return to an empty session.
    pub fn reset_session(&self) {
        let mut inner = self.lock();
        retire_active(&mut inner);
        inner.state = SessionState::default();
        tracing::debug!("solace.turn.reset");
        self.publish(&inner);
    }

    /// Clear the visible error and the quota flag.
    pub fn clear_error(&self) {
        let mut inner = self.lock();
        inner.state.error = None;
        inner.state.quota_exceeded = false;
        self.publish(&inner);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.shared.published.send_replace(inner.state.clone());
    }

    /// Supersede the turn in flight and append the new user message and
    /// reply placeholder.
    fn begin(&self, text: String) -> (ActiveTurn, TurnRequest) {
        let mut inner = self.lock();
        if retire_active(&mut inner) {
            tracing::debug!("solace.turn.superseded");
        }

        let user_id = self.shared.ids.next_id();
        let placeholder = self.shared.ids.next_id();
        let created_at = self.shared.clock.now();
        inner
            .state
            .messages
            .push(TranscriptMessage::user(user_id, text.clone(), created_at));
        inner.state.messages.push(TranscriptMessage::assistant_placeholder(
            placeholder.clone(),
            self.shared.clock.now(),
        ));
        inner.state.is_streaming = true;
        inner.state.error = None;

        inner.turns_started += 1;
        let turn = ActiveTurn {
            id: inner.turns_started,
            token: CancellationToken::new(),
            placeholder,
        };
        inner.active = Some(turn.clone());
        inner.phase = TurnPhase::Sending;

        let request = TurnRequest::new(
            self.shared.config.user_id.clone(),
            inner.state.session_id.clone(),
            text,
            self.shared.config.locale.clone(),
        );
        self.publish(&inner);
        (turn, request)
    }

    async fn drive(&self, turn: ActiveTurn, request: TurnRequest) -> TurnOutcome {
        let span = tracing::info_span!("solace.turn", turn = turn.id);
        async {
            tracing::debug!(session = ?request.session_id, "solace.turn.start");
            let streamed = self.stream_turn(&turn, &request).await;
            let outcome = match streamed {
                Ok(outcome) => outcome,
                Err(termination) => self.recover(&turn, request, termination).await,
            };
            match &outcome {
                TurnOutcome::Completed { via_fallback } => {
                    tracing::info!(via_fallback, "solace.turn.completed");
                }
                TurnOutcome::QuotaExceeded => tracing::warn!("solace.turn.quota_exceeded"),
                TurnOutcome::Failed(err) => tracing::warn!(error = %err, "solace.turn.failed"),
                TurnOutcome::Cancelled => tracing::debug!("solace.turn.abandoned"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Consume the incremental stream. `Err` carries an inconclusive
    /// termination the fallback may recover from.
    async fn stream_turn(
        &self,
        turn: &ActiveTurn,
        request: &TurnRequest,
    ) -> Result<TurnOutcome, TurnError> {
        let opened = tokio::select! {
            biased;
            _ = turn.token.cancelled() => return Ok(TurnOutcome::Cancelled),
            opened = self.shared.transport.open_stream(request.clone(), turn.token.clone()) => opened,
        };
        let frames = match opened {
            Ok(frames) => frames,
            Err(err) => {
                let class = self
                    .shared
                    .classifier
                    .transport(&err, turn.token.is_cancelled());
                return self.settle_termination(turn, class);
            }
        };

        let mut events = pin!(decode_events(frames));
        loop {
            let next = tokio::select! {
                biased;
                _ = turn.token.cancelled() => return Ok(TurnOutcome::Cancelled),
                next = events.next() => next,
            };
            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    let class = self
                        .shared
                        .classifier
                        .transport(&err, turn.token.is_cancelled());
                    return self.settle_termination(turn, class);
                }
                None => {
                    let class = self
                        .shared
                        .classifier
                        .stream_closed(turn.token.is_cancelled());
                    return self.settle_termination(turn, class);
                }
            };

            tracing::debug!(kind = event.kind(), "solace.turn.event");
            match self.apply_event(turn, event) {
                Step::Continue => {}
                Step::Finished(outcome) => return Ok(outcome),
                Step::Inconclusive(err) => return Err(err),
            }
        }
    }

    /// Final terminations are applied here; the rest go to the fallback.
    fn settle_termination(
        &self,
        turn: &ActiveTurn,
        termination: TurnError,
    ) -> Result<TurnOutcome, TurnError> {
        match termination {
            TurnError::UserCancelled => Ok(TurnOutcome::Cancelled),
            TurnError::QuotaExceeded(detail) => Ok(self.finish_quota(turn, detail)),
            other => Err(other),
        }
    }

    fn apply_event(&self, turn: &ActiveTurn, event: StreamEvent) -> Step {
        match event {
            StreamEvent::Session(payload) => {
                self.update(turn, |inner| inner.state.merge_session(&payload))
            }
            StreamEvent::Token(payload) => self.update(turn, |inner| {
                if let Some(message) = inner.state.message_mut(&turn.placeholder) {
                    message.content.push_str(&payload.delta);
                }
            }),
            StreamEvent::Complete(payload) => {
                Step::Finished(self.finish_success(turn, payload, false))
            }
            StreamEvent::Error(payload) => match self.shared.classifier.event(&payload) {
                TurnError::QuotaExceeded(detail) => Step::Finished(self.finish_quota(turn, detail)),
                other => match self.update(turn, |_| {}) {
                    Step::Continue => Step::Inconclusive(other),
                    finished => finished,
                },
            },
        }
    }

    /// Apply a mid-stream mutation and move to `Streaming`.
    fn update(&self, turn: &ActiveTurn, apply: impl FnOnce(&mut Inner)) -> Step {
        let applied = self.with_turn(turn, |inner| {
            inner.phase = TurnPhase::Streaming;
            apply(inner);
        });
        match applied {
            Some(()) => Step::Continue,
            None => Step::Finished(TurnOutcome::Cancelled),
        }
    }

    async fn recover(
        &self,
        turn: &ActiveTurn,
        request: TurnRequest,
        termination: TurnError,
    ) -> TurnOutcome {
        let mut fallback = FallbackOrchestrator::new(self.shared.config.fallback_enabled);
        if let FallbackDecision::Skip(reason) = fallback.decide(&termination) {
            tracing::debug!(?reason, error = %termination, "solace.turn.fallback.skipped");
            return self.finish_with(turn, termination);
        }

        let entered = self.with_turn_quiet(turn, |inner| {
            inner.phase = TurnPhase::Finalizing(Finalize::Fallback);
        });
        if entered.is_none() {
            return TurnOutcome::Cancelled;
        }

        tracing::info!(error = %termination, "solace.turn.fallback");
        let attempt = fallback
            .attempt(
                &self.shared.transport,
                request,
                &turn.token,
                &self.shared.classifier,
            )
            .await;
        match attempt {
            Some(Ok(response)) => self.finish_success(turn, response, true),
            Some(Err(err)) => self.finish_with(turn, err),
            None => self.finish_with(turn, termination),
        }
    }

    fn finish_with(&self, turn: &ActiveTurn, err: TurnError) -> TurnOutcome {
        match err {
            TurnError::UserCancelled => TurnOutcome::Cancelled,
            TurnError::QuotaExceeded(detail) => self.finish_quota(turn, detail),
            other => self.finish_failure(turn, other),
        }
    }

    /// Replace the placeholder with the authoritative reply.
    fn finish_success(
        &self,
        turn: &ActiveTurn,
        payload: CompletePayload,
        via_fallback: bool,
    ) -> TurnOutcome {
        let finished = self.with_turn(turn, |inner| {
            inner.phase = TurnPhase::Finalizing(Finalize::Success);
            inner.state.merge_completion(&payload);
            let mut reply = payload.reply;
            reply.streaming = false;
            match inner
                .state
                .messages
                .iter()
                .position(|m| m.id == turn.placeholder)
            {
                Some(index) => inner.state.messages[index] = reply,
                None => inner.state.messages.push(reply),
            }
            inner.state.error = None;
            inner.state.quota_exceeded = false;
            end_turn(inner);
        });
        match finished {
            Some(()) => TurnOutcome::Completed { via_fallback },
            None => TurnOutcome::Cancelled,
        }
    }

    fn finish_quota(&self, turn: &ActiveTurn, detail: String) -> TurnOutcome {
        let finished = self.with_turn(turn, |inner| {
            close_placeholder(inner, &turn.placeholder, &detail);
            inner.state.quota_exceeded = true;
            inner.state.error = Some(detail);
            end_turn(inner);
        });
        match finished {
            Some(()) => TurnOutcome::QuotaExceeded,
            None => TurnOutcome::Cancelled,
        }
    }

    fn finish_failure(&self, turn: &ActiveTurn, err: TurnError) -> TurnOutcome {
        let message = err.to_string();
        let finished = self.with_turn(turn, |inner| {
            close_placeholder(inner, &turn.placeholder, &message);
            inner.state.error = Some(message);
            end_turn(inner);
        });
        match finished {
            Some(()) => TurnOutcome::Failed(err),
            None => TurnOutcome::Cancelled,
        }
    }

    /// Run `apply` and publish, but only while `turn` is still active.
    fn with_turn<R>(&self, turn: &ActiveTurn, apply: impl FnOnce(&mut Inner) -> R) -> Option<R> {
        let mut inner = self.lock();
        if !is_current(&inner, turn) {
            return None;
        }
        let result = apply(&mut *inner);
        self.publish(&inner);
        Some(result)
    }

    /// Like [`with_turn`](Self::with_turn) for changes that leave the
    /// published state untouched.
    fn with_turn_quiet<R>(
        &self,
        turn: &ActiveTurn,
        apply: impl FnOnce(&mut Inner) -> R,
    ) -> Option<R> {
        let mut inner = self.lock();
        is_current(&inner, turn).then(|| apply(&mut *inner))
    }
}

fn validate(text: String) -> Result<String, ControllerError> {
    if text.trim().is_empty() {
        return Err(ControllerError::EmptyMessage);
    }
    Ok(text)
}

fn is_current(inner: &Inner, turn: &ActiveTurn) -> bool {
    !turn.token.is_cancelled() && inner.active.as_ref().is_some_and(|a| a.id == turn.id)
}

/// Cancel the active turn and drop its placeholder. Returns whether a turn
/// was active.
fn retire_active(inner: &mut Inner) -> bool {
    let Some(active) = inner.active.take() else {
        return false;
    };
    active.token.cancel();
    inner.state.remove_message(&active.placeholder);
    inner.state.is_streaming = false;
    inner.phase = TurnPhase::Idle;
    true
}

fn close_placeholder(inner: &mut Inner, placeholder: &MessageId, content: &str) {
    if let Some(message) = inner.state.message_mut(placeholder) {
        message.content = content.to_string();
        message.streaming = false;
    }
}

fn end_turn(inner: &mut Inner) {
    inner.state.is_streaming = false;
    inner.active = None;
    inner.phase = TurnPhase::Idle;
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_types::test_utils::{FixedClock, ScriptedTransport, SequentialIds, wire};
    use solace_types::{Role, SessionId};

    fn controller(transport: ScriptedTransport) -> TurnController<ScriptedTransport> {
        TurnController::builder(transport)
            .ids(SequentialIds::new())
            .clock(FixedClock::default())
            .build()
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_side_effects() {
        let controller = controller(ScriptedTransport::new());
        assert_eq!(
            controller.run_turn("  \n\t").await,
            Err(ControllerError::EmptyMessage)
        );
        assert!(controller.state().messages.is_empty());
        assert_eq!(controller.transport().stream_calls(), 0);
    }

    #[tokio::test]
    async fn begin_appends_user_message_and_placeholder() {
        let controller = controller(ScriptedTransport::new().open_hang());
        let handle = controller.send_message("hello").expect("non-empty");

        let state = controller.state();
        assert!(state.is_streaming);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[0].content, "hello");
        assert_eq!(state.messages[1].role, Role::Assistant);
        assert!(state.messages[1].streaming);
        assert_eq!(controller.phase(), TurnPhase::Sending);

        controller.cancel_streaming();
        assert_eq!(handle.await.expect("join"), TurnOutcome::Cancelled);
        assert_eq!(controller.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn completion_replaces_placeholder_in_place() {
        let transport = ScriptedTransport::new().stream([
            wire::session_frame("s1"),
            wire::token_frame("Hel"),
            wire::token_frame("lo"),
            wire::complete_frame("s1", "reply-1", "Hello!"),
        ]);
        let controller = controller(transport);

        let outcome = controller.run_turn("hi").await.expect("non-empty");
        assert_eq!(outcome, TurnOutcome::Completed { via_fallback: false });

        let state = controller.state();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].id.as_str(), "reply-1");
        assert_eq!(state.messages[1].content, "Hello!");
        assert!(!state.messages[1].streaming);
        assert_eq!(state.session_id, Some(SessionId::new("s1")));
        assert!(!state.is_streaming);
        assert_eq!(controller.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn initial_state_is_settled() {
        let mut restored = SessionState {
            is_streaming: true,
            ..SessionState::default()
        };
        restored.messages.push(TranscriptMessage::assistant_placeholder(
            MessageId::new("stale"),
            FixedClock::default().now(),
        ));

        let controller = TurnController::builder(ScriptedTransport::new())
            .initial_state(restored)
            .build();
        let state = controller.state();
        assert!(!state.is_streaming);
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn clear_error_resets_quota_flag() {
        let transport = ScriptedTransport::new().stream([wire::quota_frame("No tokens")]);
        let controller = controller(transport);
        assert_eq!(
            controller.run_turn("hi").await,
            Ok(TurnOutcome::QuotaExceeded)
        );
        assert!(controller.state().quota_exceeded);

        controller.clear_error();
        let state = controller.state();
        assert!(!state.quota_exceeded);
        assert!(state.error.is_none());
        assert_eq!(state.messages.len(), 2);
    }

    #[tokio::test]
    async fn reset_drops_everything() {
        let transport = ScriptedTransport::new()
            .stream([wire::complete_frame("s1", "r1", "done")]);
        let controller = controller(transport);
        controller.run_turn("hi").await.expect("non-empty");

        controller.reset_session();
        assert_eq!(controller.state(), SessionState::default());
    }
}
