//! Probe scheduler.
//!
//! [`ProbeScheduler`] is a tick-driven state machine.  The caller invokes
//! [`on_tick`](ProbeScheduler::on_tick) at least as often as the smallest
//! configured interval; each call decides, in this order:
//!
//! 1. **Completion** (bounded runs) – once the last probe is out, wait for the
//!    grace period so late outcomes are counted, emit the final summary
//!    exactly once, then go silent.
//! 2. **Send** – if `probe_interval_ms` has elapsed since the previous send,
//!    build the next sequence-numbered probe and hand it to the transport.
//! 3. **Report** – if `report_interval_ms` has elapsed since the previous
//!    report, emit a progress line from the shared counters.
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Counters | Shared [`OutcomeAggregator`] behind an `Arc`, atomic fetch-add; no globals |
//! | Timing | `u32` milliseconds with wrapping subtraction, correct across the 2^32 wrap |
//! | Grace period | Deadline checked on later ticks; `on_tick` never sleeps |
//! | Outcome attribution | Aggregate only; the radio does not say which probe a verdict belongs to |
//! | Output | `tracing` events plus a typed [`TickActivity`] per call |
//!
//! # Example
//! ```rust,ignore
//! let aggregator = Arc::new(OutcomeAggregator::new());
//! let mut scheduler = ProbeScheduler::initialize(config, radio, aggregator, clock.now_ms());
//! loop {
//!     let activity = scheduler.on_tick(clock.now_ms());
//!     if scheduler.is_finished() { break; }
//! }
//! ```

pub mod report;

pub use report::{format_uptime, ProgressReport, RunSummary};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::aggregator::{CounterSnapshot, OutcomeAggregator};
use crate::clock::elapsed_ms;
use crate::config::{ProbeConfig, RunMode};
use crate::transport::{SendMode, Transport};
use crate::wire::ProbeMessage;

// ── RunState ──────────────────────────────────────────────────────────────────

/// Timing and progress state of one run.  Touched only by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    /// Last assigned sequence number; `0` before the first probe.
    pub sequence: u32,
    pub last_send_at: u32,
    pub last_report_at: u32,
    pub run_started_at: u32,
    /// Bounded runs only.  Never cleared without re-initialisation.
    pub completed: bool,
    /// When `completed` was set; the grace period counts from here.
    pub completed_at: u32,
    pub summary_emitted: bool,
}

impl RunState {
    fn new(now: u32) -> Self {
        Self {
            sequence: 0,
            last_send_at: now,
            last_report_at: now,
            run_started_at: now,
            completed: false,
            completed_at: now,
            summary_emitted: false,
        }
    }
}

// ── TickActivity ──────────────────────────────────────────────────────────────

/// What a single [`ProbeScheduler::on_tick`] call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickActivity {
    /// Probe handed to the transport on this tick.
    pub probe: Option<ProbeMessage>,
    pub progress: Option<ProgressReport>,
    pub summary: Option<RunSummary>,
}

impl TickActivity {
    pub fn is_idle(&self) -> bool {
        self.probe.is_none() && self.progress.is_none() && self.summary.is_none()
    }
}

// ── ProbeScheduler ────────────────────────────────────────────────────────────

pub struct ProbeScheduler<T: Transport> {
    config: ProbeConfig,
    state: RunState,
    transport: T,
    aggregator: Arc<OutcomeAggregator>,
}

impl<T: Transport> ProbeScheduler<T> {
    /// Start a run at `now`.
    ///
    /// Zeroes the counters, wires `aggregator` into the transport's outcome
    /// callback and registers the peer.  A registration failure is logged and
    /// otherwise ignored: the radio may already know the peer, and every
    /// probe is still attempted.
    pub fn initialize(
        config: ProbeConfig,
        mut transport: T,
        aggregator: Arc<OutcomeAggregator>,
        now: u32,
    ) -> Self {
        aggregator.reset();
        transport.register_outcome_handler(Arc::clone(&aggregator));

        if !transport.register_peer(&config.peer) {
            warn!(peer = %config.peer, "Peer registration failed – sending anyway");
        }

        report::emit_banner(&config);

        Self {
            config,
            state: RunState::new(now),
            transport,
            aggregator,
        }
    }

    // ── Public entry point ────────────────────────────────────────────────────

    /// Advance the state machine to `now` (milliseconds on the wrapping
    /// monotonic clock).  Returns in bounded time and never blocks.
    pub fn on_tick(&mut self, now: u32) -> TickActivity {
        let mut activity = TickActivity::default();

        if self.state.summary_emitted {
            return activity;
        }

        // Only a zero limit can be reached without a send.
        if !self.state.completed && self.limit_reached() {
            self.mark_completed(now);
        }

        if self.state.completed {
            if elapsed_ms(now, self.state.completed_at) >= self.config.grace_period_ms {
                let summary = self.build_summary(now);
                summary.emit();
                self.state.summary_emitted = true;
                activity.summary = Some(summary);
            }
            return activity;
        }

        if elapsed_ms(now, self.state.last_send_at) >= self.config.probe_interval_ms {
            activity.probe = Some(self.send_probe(now));
            if self.limit_reached() {
                self.mark_completed(now);
            }
        }

        // Still runs on the tick that completed the run.
        if elapsed_ms(now, self.state.last_report_at) >= self.config.report_interval_ms {
            self.state.last_report_at = now;
            let report = ProgressReport::new(
                elapsed_ms(now, self.state.run_started_at),
                self.aggregator.snapshot(),
                self.config.mode,
            );
            report.emit();
            activity.progress = Some(report);
        }

        activity
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn current_sequence(&self) -> u32 {
        self.state.sequence
    }

    pub fn sent_count(&self) -> u32 {
        self.aggregator.sent()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.aggregator.snapshot()
    }

    /// `true` once a bounded run has sent its last probe.
    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    /// `true` once the final summary is out; further ticks are no-ops.
    pub fn is_finished(&self) -> bool {
        self.state.summary_emitted
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn limit_reached(&self) -> bool {
        match self.config.mode {
            RunMode::Continuous => false,
            RunMode::Bounded { limit } => self.state.sequence >= limit,
        }
    }

    fn mark_completed(&mut self, now: u32) {
        self.state.completed = true;
        self.state.completed_at = now;
        info!(
            probes = self.state.sequence,
            grace_ms = self.config.grace_period_ms,
            "Probe limit reached – waiting for outstanding outcomes"
        );
    }

    fn send_probe(&mut self, now: u32) -> ProbeMessage {
        self.state.last_send_at = now;
        self.state.sequence = self.state.sequence.wrapping_add(1);
        if self.state.sequence == 0 {
            warn!("Sequence counter wrapped – sequence numbers will repeat from here on");
        }

        let probe = ProbeMessage::new(self.config.magic, self.state.sequence, now);
        let frame = probe.encode();

        // Counted before hand-off so a fast verdict can never overtake it.
        self.aggregator.record_sent();

        match self.config.send_mode {
            SendMode::Unicast => {
                self.transport.send(&self.config.peer, &frame);
                debug!("[{}] PROBE #{} queued", format_uptime(now), probe.sequence);
            }
            SendMode::Broadcast => {
                let ok = self.transport.broadcast(&frame);
                debug!(
                    "[{}] PROBE #{} {}",
                    format_uptime(now),
                    probe.sequence,
                    if ok { "sent" } else { "FAILED" }
                );
                // No callback follows a broadcast; record the verdict here.
                self.aggregator.on_outcome(ok);
            }
        }

        probe
    }

    fn build_summary(&self, now: u32) -> RunSummary {
        RunSummary {
            duration_ms: elapsed_ms(now, self.state.run_started_at),
            limit: self.config.mode.limit().unwrap_or(self.state.sequence),
            counters: self.aggregator.snapshot(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
