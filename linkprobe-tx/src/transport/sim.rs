//! Simulated radio for host runs and tests.
//!
//! [`SimulatedRadio`] stands in for the vendor radio stack:
//!
//! * a peer table – registering a known peer again reports `false`, the way
//!   the real stack answers "peer exists";
//! * the receiver's acceptance check – a frame only counts as delivered if it
//!   decodes as a probe with the configured magic;
//! * a seeded loss model (`loss_percent`) and a latency model
//!   (`latency_ms` + uniform `jitter_ms`);
//! * asynchronous unicast verdicts – each outcome is delivered by a spawned
//!   tokio task after the simulated air time, i.e. from a different execution
//!   context than the scheduler that sent the probe.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::{PeerAddress, Transport};
use crate::aggregator::OutcomeAggregator;
use crate::wire::ProbeMessage;

// ── LinkProfile ───────────────────────────────────────────────────────────────

/// Characteristics of the simulated link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkProfile {
    /// Percentage of frames lost on the air (`0..=100`).
    pub loss_percent: u8,

    /// Fixed delay before a unicast verdict arrives.
    pub latency_ms: u64,

    /// Extra uniform delay in `0..=jitter_ms`.
    pub jitter_ms: u64,

    /// Seed for the loss and jitter draws; equal seeds replay identically.
    pub seed: u64,
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self {
            loss_percent: 0,
            latency_ms: 0,
            jitter_ms: 0,
            seed: 0x5EED,
        }
    }
}

// ── SimulatedRadio ────────────────────────────────────────────────────────────

pub struct SimulatedRadio {
    profile: LinkProfile,
    magic: u8,
    rng: ChaCha8Rng,
    runtime: Handle,
    peers: HashSet<PeerAddress>,
    aggregator: Option<Arc<OutcomeAggregator>>,
    frames_sent: u64,
}

impl SimulatedRadio {
    /// Create a radio whose outcome tasks run on `runtime`.
    ///
    /// `magic` is the sentinel the simulated receiver accepts.
    pub fn new(profile: LinkProfile, magic: u8, runtime: Handle) -> Self {
        debug!(
            loss_percent = profile.loss_percent,
            latency_ms = profile.latency_ms,
            jitter_ms = profile.jitter_ms,
            seed = profile.seed,
            "Simulated radio ready"
        );
        Self {
            rng: ChaCha8Rng::seed_from_u64(profile.seed),
            profile,
            magic,
            runtime,
            peers: HashSet::new(),
            aggregator: None,
            frames_sent: 0,
        }
    }

    /// Total frames handed to the radio (unicast and broadcast).
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn is_registered(&self, peer: &PeerAddress) -> bool {
        self.peers.contains(peer)
    }

    /// Would the receiver accept this frame, and did it survive the air?
    fn deliver(&mut self, payload: &[u8]) -> bool {
        if let Err(e) = ProbeMessage::decode(payload, self.magic) {
            debug!(error = %e, "Receiver rejected frame");
            return false;
        }
        (self.rng.next_u32() % 100) >= u32::from(self.profile.loss_percent)
    }

    fn air_time(&mut self) -> Duration {
        let jitter = if self.profile.jitter_ms == 0 {
            0
        } else {
            self.rng.next_u64() % self.profile.jitter_ms.saturating_add(1)
        };
        Duration::from_millis(self.profile.latency_ms.saturating_add(jitter))
    }
}

impl Transport for SimulatedRadio {
    fn register_peer(&mut self, peer: &PeerAddress) -> bool {
        let added = self.peers.insert(*peer);
        debug!(peer = %peer, added, "register_peer");
        added
    }

    fn register_outcome_handler(&mut self, aggregator: Arc<OutcomeAggregator>) {
        self.aggregator = Some(aggregator);
    }

    fn send(&mut self, peer: &PeerAddress, payload: &[u8]) {
        self.frames_sent += 1;

        let delivered = if self.peers.contains(peer) {
            self.deliver(payload)
        } else {
            warn!(peer = %peer, "Send to unregistered peer");
            false
        };
        let delay = self.air_time();

        let Some(aggregator) = self.aggregator.clone() else {
            debug!("No outcome handler registered, verdict dropped");
            return;
        };
        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            aggregator.on_outcome(delivered);
        });
    }

    fn broadcast(&mut self, payload: &[u8]) -> bool {
        self.frames_sent += 1;
        self.deliver(payload)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
