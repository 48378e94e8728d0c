//! Injectable sources of message IDs and timestamps.
//!
//! The controller never calls `Utc::now()` or `Uuid::new_v4()` directly, so
//! tests can pin both.

use chrono::{DateTime, Utc};

use crate::id::MessageId;

/// Produces fresh transcript message IDs.
pub trait IdProvider: Send + Sync {
    /// A new ID, distinct from every ID returned before.
    fn next_id(&self) -> MessageId;
}

/// Produces timestamps for transcript messages.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdProvider for UuidIds {
    fn next_id(&self) -> MessageId {
        MessageId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
