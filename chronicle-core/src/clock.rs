//! Injectable time source.
//!
//! Decay, forgetting and signal expiry all depend on elapsed time. Core
//! logic never reads the wall clock directly; it asks its [`Clock`], so
//! tests can drive time with a [`ManualClock`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::types::{MILLIS_PER_DAY, Timestamp};

/// A source of "now".
///
/// Bounded `Send + Sync` so the aggregates holding one can live behind a
/// host's lock.
pub trait Clock: fmt::Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from(Utc::now())
    }
}

/// Manually advanced clock for deterministic tests and simulations.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and hand another to the aggregate under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.as_millis())),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::Relaxed);
    }

    /// Move forward by `millis` milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        let _ = self
            .millis
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |now| Some(now.saturating_add(millis)));
    }

    /// Move forward by a (possibly fractional) number of days.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance_days(&self, days: f64) {
        self.advance_millis((days * MILLIS_PER_DAY as f64).round() as i64);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new(Timestamp(1_000));
        let handle = clock.clone();
        handle.advance_millis(500);
        assert_eq!(clock.now(), Timestamp(1_500));
        handle.advance_days(1.0);
        assert_eq!(clock.now(), Timestamp(1_500 + MILLIS_PER_DAY));
    }

    #[test]
    fn handles_advance_across_threads() {
        let clock = ManualClock::new(Timestamp(0));
        let handle = clock.clone();
        std::thread::spawn(move || handle.advance_millis(250))
            .join()
            .expect("thread");
        assert_eq!(clock.now(), Timestamp(250));
        clock.advance_millis(i64::MAX);
        assert_eq!(clock.now(), Timestamp(i64::MAX));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().as_millis() > 1_577_836_800_000);
    }
}
