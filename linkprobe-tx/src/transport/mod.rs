/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Radio transport seam.
//!
//! The scheduler never talks to a radio directly; it consumes the narrow
//! [`Transport`] trait.  [`sim::SimulatedRadio`] implements it for host runs
//! and tests.  A firmware build provides its own implementation over the
//! vendor radio API.

pub mod sim;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::aggregator::OutcomeAggregator;

// ── PeerAddress ───────────────────────────────────────────────────────────────

/// 6-byte radio (MAC) address of the probe target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct PeerAddress([u8; 6]);

/// Errors produced while parsing a [`PeerAddress`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerAddressError {
    #[error("peer address '{0}' must have 6 octets separated by ':' or '-'")]
    OctetCount(String),

    #[error("peer address '{input}' has an invalid octet '{octet}'")]
    InvalidOctet { input: String, octet: String },
}

impl PeerAddress {
    /// All-ones address used for broadcast sends.
    pub const BROADCAST: PeerAddress = PeerAddress([0xFF; 6]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl FromStr for PeerAddress {
    type Err = PeerAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(PeerAddressError::OctetCount(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            // from_str_radix alone would accept a leading '+'.
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(PeerAddressError::InvalidOctet {
                    input: s.to_string(),
                    octet: part.to_string(),
                });
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| PeerAddressError::InvalidOctet {
                input: s.to_string(),
                octet: part.to_string(),
            })?;
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = PeerAddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

// ── SendMode ──────────────────────────────────────────────────────────────────

/// How probes leave the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    /// Addressed to the peer; the verdict arrives later through the
    /// registered outcome handler.
    #[default]
    Unicast,

    /// Sent to every listener; the radio answers immediately and no
    /// asynchronous outcome follows.
    Broadcast,
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::Unicast => f.write_str("unicast"),
            SendMode::Broadcast => f.write_str("broadcast"),
        }
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Narrow interface onto the radio stack.
///
/// Implementations are assumed to be initialised and to perform their own
/// retries; only the final verdict of each unicast send is reported, via
/// [`OutcomeAggregator::on_outcome`], possibly from another thread.
pub trait Transport {
    /// Add `peer` to the radio's peer table.
    ///
    /// `false` is not fatal: the stack may already know the peer.
    fn register_peer(&mut self, peer: &PeerAddress) -> bool;

    /// Install the delivery-outcome callback target for unicast sends.
    fn register_outcome_handler(&mut self, aggregator: Arc<OutcomeAggregator>);

    /// Fire-and-forget unicast.  The outcome arrives later, at most once.
    fn send(&mut self, peer: &PeerAddress, payload: &[u8]);

    /// Broadcast with an immediate verdict.
    fn broadcast(&mut self, payload: &[u8]) -> bool;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
