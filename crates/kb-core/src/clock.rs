//! Injected time source.
//!
//! `created_at`/`updated_at` and the timestamp-shaped ids of `sessions`
//! items are all generated from a [`Clock`] rather than calling
//! `chrono::Utc::now()` directly, so tests can assert on exact values
//! instead of asserting "close to now".

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock that starts at a fixed instant and advances by a configurable
/// step on every call, so successive timestamps in a test are distinct and
/// ordered without depending on real elapsed time.
pub struct FixedClock {
    millis: AtomicI64,
    step_millis: i64,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
            step_millis: 1,
        }
    }

    pub fn with_step(start: DateTime<Utc>, step_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
            step_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.fetch_add(self.step_millis, Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).expect("fixed clock millis in range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(Utc::now());
        let a = clock.now();
        let b = clock.now();
        assert!(b > a);
    }
}
