//! Predictable ID and clock providers.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};

use crate::id::MessageId;
use crate::provider::{Clock, IdProvider};

/// Hands out `msg-1`, `msg-2`, ... in call order.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Start counting at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdProvider for SequentialIds {
    fn next_id(&self) -> MessageId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        MessageId::new(format!("msg-{n}"))
    }
}

/// Returns the same instant, advanced by one second per call so ordering by
/// timestamp stays meaningful.
#[derive(Debug)]
pub struct FixedClock {
    start: DateTime<Utc>,
    ticks: AtomicU64,
}

impl FixedClock {
    /// A clock starting at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            ticks: AtomicU64::new(0),
        }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::seconds(tick as i64)
    }
}
