//! Clock abstraction so event timestamps and entity timestamps are
//! deterministic under test.

use chrono::{DateTime, Utc};

/// Source of the current time for envelopes and entity rows.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
