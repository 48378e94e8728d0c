//! One-shot non-incremental fallback.
//!
//! When a stream ends without a `complete` event, the turn gets exactly one
//! retry through [`TurnTransport::send_turn`]. Quota and cancellation are
//! final and never retried.

use solace_types::{TurnError, TurnRequest, TurnResponse, TurnTransport};
use tokio_util::sync::CancellationToken;

use crate::classify::ErrorClassifier;

/// Whether the fallback should run for a given termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    /// Issue the non-incremental request.
    Attempt,
    /// Surface the termination as is.
    Skip(SkipReason),
}

/// Why a fallback was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fallback is turned off in [`TurnConfig`](crate::TurnConfig).
    Disabled,
    /// The turn was cancelled or superseded.
    Cancelled,
    /// The account is out of turns.
    QuotaExceeded,
    /// This turn already used its fallback.
    AlreadyAttempted,
}

/// Tracks the fallback budget of a single turn.
#[derive(Debug)]
pub struct FallbackOrchestrator {
    enabled: bool,
    attempted: bool,
}

impl FallbackOrchestrator {
    /// A fresh budget. `enabled = false` skips every termination.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            attempted: false,
        }
    }

    /// Whether the fallback request has been issued.
    pub fn attempted(&self) -> bool {
        self.attempted
    }

    /// Decide what to do about `termination`.
    pub fn decide(&self, termination: &TurnError) -> FallbackDecision {
        match termination {
            TurnError::UserCancelled => FallbackDecision::Skip(SkipReason::Cancelled),
            TurnError::QuotaExceeded(_) => FallbackDecision::Skip(SkipReason::QuotaExceeded),
            _ if !self.enabled => FallbackDecision::Skip(SkipReason::Disabled),
            _ if self.attempted => FallbackDecision::Skip(SkipReason::AlreadyAttempted),
            _ => FallbackDecision::Attempt,
        }
    }

    /// Issue the fallback request, racing it against `cancel`.
    ///
    /// Returns `None` when the budget is already spent.
    pub async fn attempt<T: TurnTransport>(
        &mut self,
        transport: &T,
        request: TurnRequest,
        cancel: &CancellationToken,
        classifier: &ErrorClassifier,
    ) -> Option<Result<TurnResponse, TurnError>> {
        if self.attempted {
            return None;
        }
        self.attempted = true;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Some(Err(TurnError::UserCancelled)),
            result = transport.send_turn(request, cancel.clone()) => result,
        };

        Some(result.map_err(|e| classifier.transport(&e, cancel.is_cancelled())))
    }
}
