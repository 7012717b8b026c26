//! Dispatch pacing for outbound sends.
//!
//! The queue dispatches at most `rate_limit_per_minute` sends per minute by
//! enforcing a minimum spacing between consecutive dispatch timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime};

/// Minimum spacing between dispatches for the given per-minute ceiling.
pub fn min_interval_ms(rate_limit_per_minute: u32) -> i64 {
    60_000 / rate_limit_per_minute.max(1) as i64
}

/// Remaining wait before the next dispatch may start.
///
/// Returns zero when enough time has elapsed since `last_sent_at_ms`.
pub fn wait_time(last_sent_at_ms: i64, now_ms: i64, rate_limit_per_minute: u32) -> Duration {
    let elapsed = now_ms - last_sent_at_ms;
    let deficit = min_interval_ms(rate_limit_per_minute) - elapsed;
    if deficit > 0 {
        Duration::from_millis(deficit as u64)
    } else {
        Duration::ZERO
    }
}

/// Tracks the timestamp of the last dispatched send.
///
/// Uses an atomic for lock-free access. The timestamp is marked immediately
/// before each transport invocation, so a slow or failing send cannot let
/// the next dispatch start early.
#[derive(Debug)]
pub struct DispatchPacer {
    /// Last dispatch timestamp (Unix milliseconds); 0 means no send yet
    last_sent: AtomicI64,
    /// Dispatch ceiling in sends per minute
    rate_limit_per_minute: u32,
}

impl DispatchPacer {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            last_sent: AtomicI64::new(0),
            rate_limit_per_minute,
        }
    }

    /// Get current time in milliseconds
    pub fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Wait required before the next dispatch may start.
    pub fn wait_time(&self) -> Duration {
        let last = self.last_sent.load(Ordering::Relaxed);
        if last == 0 {
            return Duration::ZERO;
        }
        wait_time(last, Self::now_millis(), self.rate_limit_per_minute)
    }

    /// Record that a dispatch is starting now.
    pub fn mark_dispatch(&self) {
        self.last_sent.store(Self::now_millis(), Ordering::Relaxed);
    }

    /// Timestamp of the last dispatch (Unix milliseconds), 0 if none yet.
    pub fn last_dispatch_at(&self) -> i64 {
        self.last_sent.load(Ordering::Relaxed)
    }
}
