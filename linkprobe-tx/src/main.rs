/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use linkprobe_tx::aggregator::OutcomeAggregator;
use linkprobe_tx::clock::{Clock, MonotonicClock};
use linkprobe_tx::config::{ProbeConfig, RunMode};
use linkprobe_tx::runner::{run, RunExit};
use linkprobe_tx::scheduler::ProbeScheduler;
use linkprobe_tx::transport::sim::SimulatedRadio;
use linkprobe_tx::transport::{PeerAddress, SendMode};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Link-quality diagnostic transmitter (host build, simulated radio).
///
/// Example:
///   linkprobe-tx -p 24:6F:28:AA:BB:CC -i 100 -l 500 --loss 5 --latency 20
#[derive(Debug, Parser)]
#[command(
    name = "linkprobe-tx",
    about = "Link-quality diagnostic transmitter – probe scheduler and outcome aggregator",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML probe configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Probe interval in milliseconds (0 = every tick).
    #[arg(short = 'i', long = "interval")]
    interval_ms: Option<u32>,

    /// Progress report interval in milliseconds.
    #[arg(short = 'r', long = "report-interval")]
    report_interval_ms: Option<u32>,

    /// Grace period before the final summary of a bounded run, in milliseconds.
    #[arg(short = 'g', long = "grace")]
    grace_period_ms: Option<u32>,

    /// Stop after this many probes (bounded run).  Omit for a continuous run.
    #[arg(short = 'l', long = "limit")]
    limit: Option<u32>,

    /// Peer radio address, e.g. 24:6F:28:AA:BB:CC.
    #[arg(short = 'p', long = "peer")]
    peer: Option<PeerAddress>,

    /// Broadcast probes instead of unicasting them to the peer.
    #[arg(short = 'b', long = "broadcast", default_value_t = false)]
    broadcast: bool,

    /// Sentinel byte written at the start of every probe.
    #[arg(long = "magic")]
    magic: Option<u8>,

    /// Simulated link loss in percent.
    #[arg(long = "loss")]
    loss_percent: Option<u8>,

    /// Simulated verdict latency in milliseconds.
    #[arg(long = "latency")]
    latency_ms: Option<u64>,

    /// Simulated latency jitter in milliseconds.
    #[arg(long = "jitter")]
    jitter_ms: Option<u64>,

    /// Seed for the simulated link.
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Driver tick period in milliseconds.
    #[arg(short = 't', long = "tick-ms", default_value_t = 10)]
    tick_ms: u64,
}

impl Cli {
    /// File (or defaults) first, then command-line overrides.
    fn resolve_config(&self) -> Result<ProbeConfig> {
        let mut config = match &self.config {
            Some(path) => ProbeConfig::load_from_file(path)?,
            None => {
                warn!("No configuration file provided, using defaults");
                ProbeConfig::default()
            }
        };

        if let Some(v) = self.interval_ms {
            config.probe_interval_ms = v;
        }
        if let Some(v) = self.report_interval_ms {
            config.report_interval_ms = v;
        }
        if let Some(v) = self.grace_period_ms {
            config.grace_period_ms = v;
        }
        if let Some(limit) = self.limit {
            config.mode = RunMode::Bounded { limit };
        }
        if let Some(peer) = self.peer {
            config.peer = peer;
        }
        if self.broadcast {
            config.send_mode = SendMode::Broadcast;
            if self.peer.is_none() {
                config.peer = PeerAddress::BROADCAST;
            }
        }
        if let Some(v) = self.magic {
            config.magic = v;
        }
        if let Some(v) = self.loss_percent {
            config.link.loss_percent = v;
        }
        if let Some(v) = self.latency_ms {
            config.link.latency_ms = v;
        }
        if let Some(v) = self.jitter_ms {
            config.link.jitter_ms = v;
        }
        if let Some(v) = self.seed {
            config.link.seed = v;
        }

        config.validate()?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("linkprobe-tx starting up...");

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            process::exit(1);
        }
    };

    info!(
        mode               = %config.mode,
        probe_interval_ms  = config.probe_interval_ms,
        report_interval_ms = config.report_interval_ms,
        grace_period_ms    = config.grace_period_ms,
        peer               = %config.peer,
        send_mode          = %config.send_mode,
        loss_percent       = config.link.loss_percent,
        latency_ms         = config.link.latency_ms,
        tick_ms            = cli.tick_ms,
        "Configuration"
    );

    // ── Build the run ─────────────────────────────────────────────────────────
    let clock = MonotonicClock::new();
    let radio = SimulatedRadio::new(config.link, config.magic, Handle::current());
    let aggregator = Arc::new(OutcomeAggregator::new());
    let mut scheduler = ProbeScheduler::initialize(config, radio, aggregator, clock.now_ms());

    // ── Drive until completion or Ctrl-C ──────────────────────────────────────
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let (exit, counters) = run(
        &mut scheduler,
        &clock,
        Duration::from_millis(cli.tick_ms),
        shutdown,
    )
    .await;

    if exit == RunExit::Shutdown {
        info!(
            sent = counters.sent,
            succeeded = counters.succeeded,
            failed = counters.failed,
            in_flight = counters.in_flight(),
            success_pct = %format!("{:.1}", counters.success_rate() * 100.0),
            "Interrupted"
        );
    }
}
