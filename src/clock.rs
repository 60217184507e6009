//! Wall clock shared by the fetch, render and night tasks.
//!
//! The sign has no trustworthy time source of its own. The system clock is
//! corrected from the `Date` header of API responses; [`Clock::sync`] stores
//! the difference to the server instead of touching the host clock.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Settable epoch clock.
pub trait Clock {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Adopt `server` as the current time.
    ///
    /// Returns the correction in whole seconds (`server - previous now`) when
    /// the clock had been synced before, `None` on the first sync.
    fn sync(&self, server: DateTime<Utc>) -> Option<i64>;

    fn is_synced(&self) -> bool;

    /// Current time in UTC epoch seconds.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// System clock plus an offset learned from the server.
#[derive(Debug, Default)]
pub struct SyncedClock {
    offset_ms: AtomicI64,
    synced: AtomicBool,
}

impl SyncedClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SyncedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::milliseconds(self.offset_ms.load(Ordering::Relaxed))
    }

    fn sync(&self, server: DateTime<Utc>) -> Option<i64> {
        let before = self.now();
        let offset = server - Utc::now();
        self.offset_ms
            .store(offset.num_milliseconds(), Ordering::Relaxed);
        let was_synced = self.synced.swap(true, Ordering::Relaxed);
        was_synced.then(|| (server - before).num_seconds())
    }

    fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Relaxed)
    }
}

/// Clock that only moves when told to. Used for replaying recorded
/// responses and in tests.
#[derive(Debug)]
pub struct ManualClock {
    epoch_seconds: AtomicI64,
    synced: AtomicBool,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            epoch_seconds: AtomicI64::new(start.timestamp()),
            synced: AtomicBool::new(false),
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.epoch_seconds.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.epoch_seconds.load(Ordering::Relaxed), 0).unwrap_or_default()
    }

    fn sync(&self, server: DateTime<Utc>) -> Option<i64> {
        let before = self.epoch_seconds.swap(server.timestamp(), Ordering::Relaxed);
        let was_synced = self.synced.swap(true, Ordering::Relaxed);
        was_synced.then(|| server.timestamp() - before)
    }

    fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Relaxed)
    }
}
