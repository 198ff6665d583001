/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Diagnostic report types and their log emission.
//!
//! The text stream is meant for people watching a serial console or a
//! terminal; its format is stable but not a machine contract.  Every report
//! is also returned to the caller as a typed value so that tests and host
//! tooling never have to scrape log lines.

use std::fmt;

use tracing::info;

use crate::aggregator::CounterSnapshot;
use crate::config::{ProbeConfig, RunMode};

/// Format milliseconds of uptime as `HH:MM:SS` (hours are not capped at 24).
pub fn format_uptime(ms: u32) -> String {
    let total_secs = ms / 1_000;
    let hours = total_secs / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;
    format!("{hours:02}:{mins:02}:{secs:02}")
}

// ── ProgressReport ────────────────────────────────────────────────────────────

/// Periodic status line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// Time since the run started.
    pub elapsed_ms: u32,
    pub counters: CounterSnapshot,
    /// `sent / limit` in percent; `None` for continuous runs.
    pub percent_of_limit: Option<f64>,
}

impl ProgressReport {
    pub(crate) fn new(elapsed_ms: u32, counters: CounterSnapshot, mode: RunMode) -> Self {
        let percent_of_limit = mode.limit().map(|limit| {
            if limit == 0 {
                100.0
            } else {
                counters.sent as f64 * 100.0 / limit as f64
            }
        });
        Self {
            elapsed_ms,
            counters,
            percent_of_limit,
        }
    }

    pub(crate) fn emit(&self) {
        let c = &self.counters;
        info!(
            elapsed = %format_uptime(self.elapsed_ms),
            sent = c.sent,
            succeeded = c.succeeded,
            failed = c.failed,
            success_pct = %format!("{:.1}", c.success_rate() * 100.0),
            progress_pct = ?self.percent_of_limit.map(|p| (p * 10.0).round() / 10.0),
            "Progress"
        );
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        write!(
            f,
            "[{}] sent={} ok={} failed={} success={:.1}%",
            format_uptime(self.elapsed_ms),
            c.sent,
            c.succeeded,
            c.failed,
            c.success_rate() * 100.0
        )?;
        if let Some(pct) = self.percent_of_limit {
            write!(f, " progress={pct:.1}%")?;
        }
        Ok(())
    }
}

// ── RunSummary ────────────────────────────────────────────────────────────────

/// One-time final report of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// From run start to summary emission (includes the grace period).
    pub duration_ms: u32,
    pub limit: u32,
    pub counters: CounterSnapshot,
}

impl RunSummary {
    pub fn success_rate(&self) -> f64 {
        self.counters.success_rate()
    }

    /// Outcomes that never arrived, even after the grace period.
    pub fn unaccounted(&self) -> u32 {
        self.counters.in_flight()
    }

    pub(crate) fn emit(&self) {
        let c = &self.counters;
        info!("══════════════════ PROBE RUN COMPLETE ══════════════════");
        info!("  Duration:    {}", format_uptime(self.duration_ms));
        info!("  Probes:      {} of {}", c.sent, self.limit);
        info!("  Delivered:   {}", c.succeeded);
        info!("  Failed:      {}", c.failed);
        info!("  No verdict:  {}", self.unaccounted());
        info!("  Success:     {:.1}%", self.success_rate() * 100.0);
        info!("═════════════════════════════════════════════════════════");
    }
}

/// Startup banner describing the run.
pub(crate) fn emit_banner(config: &ProbeConfig) {
    info!("══════════════ LINK-QUALITY PROBE TRANSMITTER ══════════════");
    info!("  Mode:            {}", config.mode);
    info!("  Probe interval:  {} ms", config.probe_interval_ms);
    info!("  Report interval: {} ms", config.report_interval_ms);
    info!("  Peer:            {} ({})", config.peer, config.send_mode);
    info!("  Magic:           0x{:02X}", config.magic);
    info!("════════════════════════════════════════════════════════════");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
