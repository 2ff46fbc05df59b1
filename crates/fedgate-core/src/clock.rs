//! Injectable clock abstraction.
//!
//! Every component that compares timestamps (cache TTLs, token creation
//! times, metadata validity windows) takes an `Arc<dyn Clock>` instead of
//! calling `OffsetDateTime::now_utc()` directly. Production code uses
//! [`SystemClock`]; tests use [`ManualClock`] to step time forward
//! deterministically.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use time::OffsetDateTime;

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Starts at a fixed instant and only moves when [`advance`](Self::advance)
/// or [`set`](Self::set) is called.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Creates a clock frozen at the Unix epoch.
    #[must_use]
    pub fn epoch() -> Self {
        Self::new(OffsetDateTime::UNIX_EPOCH)
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, instant: OffsetDateTime) {
        let mut now = self.now.lock().unwrap();
        *now = instant;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}
