/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Delivery-outcome aggregation.
//!
//! [`OutcomeAggregator`] owns the three run counters and is shared by `Arc`
//! between two execution contexts:
//!
//! ```text
//! scheduler tick ──record_sent()──┐
//!                                 ├──►  sent / succeeded / failed  ──snapshot()──► reports
//! radio callback ──on_outcome()───┘
//! ```
//!
//! # Attribution
//! The radio reports a bare success/failure verdict with no sequence number,
//! so outcomes are counted in aggregate against the most recent cohort of
//! in-flight probes.  With one peer and mostly serial sends the counters stay
//! meaningful; under reordering the per-probe attribution is approximate.
//!
//! # Ordering
//! `sent` is bumped *before* a probe is handed to the radio and every outcome
//! happens after its send, so an observer that loads `succeeded` and `failed`
//! first and `sent` last always sees `succeeded + failed <= sent`.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::warn;

// ── CounterSnapshot ───────────────────────────────────────────────────────────

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub sent: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl CounterSnapshot {
    /// `succeeded / sent` as a fraction in `0.0..=1.0`.
    ///
    /// Returns `0.0` when nothing has been sent.
    pub fn success_rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.sent as f64
        }
    }

    /// Probes whose outcome has not arrived yet.
    pub fn in_flight(&self) -> u32 {
        self.sent
            .saturating_sub(self.succeeded.saturating_add(self.failed))
    }
}

// ── OutcomeAggregator ─────────────────────────────────────────────────────────

/// Lock-free run counters.  One instance per run, shared by `Arc`.
#[derive(Debug, Default)]
pub struct OutcomeAggregator {
    sent: AtomicU32,
    succeeded: AtomicU32,
    failed: AtomicU32,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the delivery verdict for one earlier probe.
    ///
    /// Safe to call from any thread or task, concurrently with the scheduler.
    /// Failures are reported immediately; successes are only counted.
    pub fn on_outcome(&self, success: bool) {
        if success {
            self.succeeded.fetch_add(1, Ordering::AcqRel);
        } else {
            let failed = self.failed.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
            let sent = self.sent.load(Ordering::Acquire);
            warn!(failed, sent, "✗ probe delivery failed");
        }
    }

    /// Count one probe as sent and return the new total.
    ///
    /// Called by the scheduler only, before the probe reaches the radio.
    pub(crate) fn record_sent(&self) -> u32 {
        self.sent.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Zero all counters.  Only meaningful at (re-)initialisation, before any
    /// probe of the new run is in flight.
    pub(crate) fn reset(&self) {
        self.succeeded.store(0, Ordering::Release);
        self.failed.store(0, Ordering::Release);
        self.sent.store(0, Ordering::Release);
    }

    pub fn sent(&self) -> u32 {
        self.sent.load(Ordering::Acquire)
    }

    /// Consistent view satisfying `succeeded + failed <= sent`.
    pub fn snapshot(&self) -> CounterSnapshot {
        let succeeded = self.succeeded.load(Ordering::Acquire);
        let failed = self.failed.load(Ordering::Acquire);
        // Loaded last: see the module docs.
        let sent = self.sent.load(Ordering::Acquire);
        CounterSnapshot {
            sent,
            succeeded,
            failed,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    // ── CounterSnapshot ───────────────────────────────────────────────────────

    #[test]
    fn success_rate_zero_when_nothing_sent() {
        assert_eq!(CounterSnapshot::default().success_rate(), 0.0);
    }

    #[test]
    fn success_rate_two_of_three() {
        let snap = CounterSnapshot {
            sent: 3,
            succeeded: 2,
            failed: 1,
        };
        assert!((snap.success_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(format!("{:.1}", snap.success_rate() * 100.0), "66.7");
    }

    #[test]
    fn in_flight_counts_missing_outcomes() {
        let snap = CounterSnapshot {
            sent: 10,
            succeeded: 6,
            failed: 1,
        };
        assert_eq!(snap.in_flight(), 3);
    }

    // ── OutcomeAggregator ─────────────────────────────────────────────────────

    #[test]
    fn outcomes_update_the_matching_counter() {
        let agg = OutcomeAggregator::new();
        for _ in 0..3 {
            agg.record_sent();
        }
        agg.on_outcome(true);
        agg.on_outcome(false);
        agg.on_outcome(true);

        assert_eq!(
            agg.snapshot(),
            CounterSnapshot {
                sent: 3,
                succeeded: 2,
                failed: 1
            }
        );
    }

    #[test]
    fn reset_zeroes_everything() {
        let agg = OutcomeAggregator::new();
        agg.record_sent();
        agg.on_outcome(false);
        agg.reset();
        assert_eq!(agg.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn concurrent_outcomes_are_never_lost() {
        const PER_THREAD: u32 = 10_000;
        let agg = Arc::new(OutcomeAggregator::new());
        for _ in 0..(4 * PER_THREAD) {
            agg.record_sent();
        }

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let agg = Arc::clone(&agg);
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        agg.on_outcome(i % 2 == 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = agg.snapshot();
        assert_eq!(snap.succeeded, 2 * PER_THREAD);
        assert_eq!(snap.failed, 2 * PER_THREAD);
        assert_eq!(snap.in_flight(), 0);
    }

    #[test]
    fn snapshot_never_shows_more_outcomes_than_sends() {
        // Producer sends then reports; the observer must never see the
        // outcome without the send that preceded it.
        let agg = Arc::new(OutcomeAggregator::new());
        let producer = {
            let agg = Arc::clone(&agg);
            thread::spawn(move || {
                for i in 0..20_000u32 {
                    agg.record_sent();
                    agg.on_outcome(i % 3 != 0);
                }
            })
        };

        while !producer.is_finished() {
            let snap = agg.snapshot();
            assert!(
                snap.succeeded + snap.failed <= snap.sent,
                "invariant violated: {snap:?}"
            );
        }
        producer.join().unwrap();
        assert_eq!(agg.snapshot().sent, 20_000);
    }
}
