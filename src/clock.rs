//! Injectable time source.
//!
//! Cooldown arithmetic uses monotonic [`Instant`]s; snapshots carry wall-clock
//! epoch milliseconds. Tests swap in [`MockClock`] and advance simulated time
//! instead of sleeping through real cooldowns.

use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time source used by breakers and the registry.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Monotonic reading used for cooldown arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the Unix epoch, used only in snapshots.
    fn epoch_ms(&self) -> u64;
}

/// Production clock backed by the system time sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug)]
pub struct MockClock {
    start: Instant,
    start_epoch_ms: u64,
    offset: Mutex<Duration>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            start_epoch_ms: SystemClock.epoch_ms(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move simulated time forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    fn epoch_ms(&self) -> u64 {
        self.start_epoch_ms + self.offset.lock().unwrap().as_millis() as u64
    }
}
