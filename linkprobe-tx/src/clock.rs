/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Monotonic millisecond clock.
//!
//! The device exposes "milliseconds since boot" as a `u32` that wraps after
//! roughly 49.7 days.  Every interval in the crate is measured with
//! [`elapsed_ms`], which is correct across that wrap as long as the real
//! interval is shorter than 2^32 ms.

use std::sync::atomic::{AtomicU32, Ordering};

use tokio::time::Instant;

/// Source of "milliseconds since boot".
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Milliseconds from `earlier` to `now` on a wrapping `u32` clock.
///
/// A `now` that is slightly behind `earlier` yields a huge value rather than
/// underflowing; callers compare it against an interval, so the anomaly
/// self-corrects once the clock moves past `earlier` again.
pub fn elapsed_ms(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

// ── MonotonicClock ────────────────────────────────────────────────────────────

/// Host clock backed by tokio's monotonic [`Instant`].
///
/// Truncated to `u32` so it wraps exactly like the device counter.  Using the
/// tokio instant (rather than `std::time::Instant`) lets paused-time tests
/// drive it.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    boot: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            boot: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.boot.elapsed().as_millis() as u32
    }
}

// ── ManualClock ───────────────────────────────────────────────────────────────

/// Hand-driven clock for tests and replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn starting_at(ms: u32) -> Self {
        Self {
            now: AtomicU32::new(ms),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Relaxed);
    }

    /// Advance by `ms`, wrapping at 2^32.
    pub fn advance(&self, ms: u32) {
        let _ = self
            .now
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| {
                Some(t.wrapping_add(ms))
            });
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_is_plain_difference_without_wrap() {
        assert_eq!(elapsed_ms(1_500, 1_000), 500);
        assert_eq!(elapsed_ms(1_000, 1_000), 0);
    }

    #[test]
    fn elapsed_spans_the_wrap() {
        // 5 ms before the wrap → 5 ms after it = 10 ms.
        assert_eq!(elapsed_ms(4, u32::MAX - 5), 10);
    }

    #[test]
    fn clock_going_backwards_does_not_panic() {
        // Large value, not an underflow panic.
        assert_eq!(elapsed_ms(990, 1_000), u32::MAX - 9);
    }

    #[test]
    fn manual_clock_advance_wraps() {
        let clock = ManualClock::starting_at(u32::MAX - 1);
        clock.advance(3);
        assert_eq!(clock.now_ms(), 1);
        clock.set(77);
        assert_eq!(clock.now_ms(), 77);
    }

    #[tokio::test(start_paused = true)]
    async fn monotonic_clock_follows_tokio_time() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.now_ms(), 0);
        tokio::time::advance(Duration::from_millis(1_250)).await;
        assert_eq!(clock.now_ms(), 1_250);
    }
}
