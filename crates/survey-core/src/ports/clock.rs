//! Wall-clock port.
//!
//! The gate needs "today" as a calendar day-of-year and the recorder needs
//! an epoch timestamp. Both come from here so tests can pin them.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use chrono::{Datelike, Local, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Local calendar day of the year, `1..=366`.
    fn day_of_year(&self) -> u32;
}

/// Clock backed by the system time and local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn day_of_year(&self) -> u32 {
        Local::now().ordinal()
    }
}

/// Clock whose values are set explicitly.
///
/// Used by tests and by the CLI's `--day` override.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
    day: AtomicU32,
}

impl ManualClock {
    /// Create a clock pinned at `millis` on `day_of_year`.
    pub const fn new(millis: i64, day_of_year: u32) -> Self {
        Self {
            millis: AtomicI64::new(millis),
            day: AtomicU32::new(day_of_year),
        }
    }

    /// Move to another day of the year.
    pub fn set_day(&self, day_of_year: u32) {
        self.day.store(day_of_year, Ordering::SeqCst);
    }

    /// Move the epoch timestamp.
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn day_of_year(&self) -> u32 {
        self.day.load(Ordering::SeqCst)
    }
}
