/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host driver loop.
//!
//! Supplies the periodic tick the scheduler expects: a tokio interval reads
//! the clock and calls [`ProbeScheduler::on_tick`] until a bounded run has
//! emitted its summary or the shutdown future resolves.  A tick that falls
//! behind is delayed rather than burst, so a stalled runtime never fires a
//! volley of probes.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::aggregator::CounterSnapshot;
use crate::clock::Clock;
use crate::scheduler::ProbeScheduler;
use crate::transport::Transport;

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Bounded run finished and its summary was emitted.
    Completed,
    /// The shutdown future resolved first.
    Shutdown,
}

/// Drive `scheduler` every `tick_period` until it finishes or `shutdown`
/// resolves.  Returns the exit reason and the final counters.
pub async fn run<T, C, F>(
    scheduler: &mut ProbeScheduler<T>,
    clock: &C,
    tick_period: Duration,
    shutdown: F,
) -> (RunExit, CounterSnapshot)
where
    T: Transport,
    C: Clock,
    F: Future<Output = ()>,
{
    let mut ticker = interval(tick_period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let exit = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break RunExit::Shutdown;
            }
            _ = ticker.tick() => {
                let _ = scheduler.on_tick(clock.now_ms());
                if scheduler.is_finished() {
                    break RunExit::Completed;
                }
            }
        }
    };

    let counters = scheduler.counters();
    info!(
        sent = counters.sent,
        succeeded = counters.succeeded,
        failed = counters.failed,
        exit = ?exit,
        "Probe run stopped"
    );
    (exit, counters)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
