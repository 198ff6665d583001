/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Probe wire format.
//!
//! One message type travels over the radio:
//!
//! ```text
//! offset  0      1              5              9
//!         ┌──────┬──────────────┬──────────────┐
//!         │magic │ sequence     │ uptime_ms    │
//!         │ u8   │ u32 LE       │ u32 LE       │
//!         └──────┴──────────────┴──────────────┘
//! ```
//!
//! Both ends of the link run the same firmware, so the byte order is fixed to
//! little-endian (native on the ESP32-class targets) and never negotiated.
//! The receiver accepts a frame only when its length is exactly
//! [`PROBE_FRAME_LEN`] and the first byte matches the configured sentinel.
//!
//! Fields are written one by one at fixed offsets; the in-memory layout of
//! [`ProbeMessage`] plays no part in the encoding.

use thiserror::Error;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default sentinel that tags diagnostic probe traffic on a shared channel.
pub const DEFAULT_MAGIC: u8 = 0xAA;

/// Encoded size of a [`ProbeMessage`]: 1 (magic) + 4 (sequence) + 4 (uptime).
pub const PROBE_FRAME_LEN: usize = 9;

const MAGIC_OFFSET: usize = 0;
const SEQUENCE_OFFSET: usize = 1;
const UPTIME_OFFSET: usize = 5;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Reasons a received frame is not accepted as a probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The frame is not exactly [`PROBE_FRAME_LEN`] bytes long.
    #[error("probe frame must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    /// The first byte is not the expected sentinel.
    #[error("unexpected magic 0x{actual:02X} (expected 0x{expected:02X})")]
    Magic { expected: u8, actual: u8 },
}

// ── ProbeMessage ──────────────────────────────────────────────────────────────

/// A single outbound diagnostic probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeMessage {
    /// Sentinel distinguishing probe traffic from other radio traffic.
    pub magic: u8,

    /// Strictly increasing per run, starting at 1.
    pub sequence: u32,

    /// Sender's monotonic clock at construction time (not wall time).
    pub sender_uptime_ms: u32,
}

impl ProbeMessage {
    pub fn new(magic: u8, sequence: u32, sender_uptime_ms: u32) -> Self {
        Self {
            magic,
            sequence,
            sender_uptime_ms,
        }
    }

    /// Encode into the fixed 9-byte frame.
    pub fn encode(&self) -> [u8; PROBE_FRAME_LEN] {
        let mut frame = [0u8; PROBE_FRAME_LEN];
        frame[MAGIC_OFFSET] = self.magic;
        frame[SEQUENCE_OFFSET..UPTIME_OFFSET].copy_from_slice(&self.sequence.to_le_bytes());
        frame[UPTIME_OFFSET..PROBE_FRAME_LEN]
            .copy_from_slice(&self.sender_uptime_ms.to_le_bytes());
        frame
    }

    /// Validate and decode a received frame, as the receiving node does.
    ///
    /// # Errors
    /// * [`WireError::Length`] – `frame` is not exactly 9 bytes.
    /// * [`WireError::Magic`] – the first byte is not `expected_magic`.
    pub fn decode(frame: &[u8], expected_magic: u8) -> Result<Self, WireError> {
        if frame.len() != PROBE_FRAME_LEN {
            return Err(WireError::Length {
                expected: PROBE_FRAME_LEN,
                actual: frame.len(),
            });
        }
        if frame[MAGIC_OFFSET] != expected_magic {
            return Err(WireError::Magic {
                expected: expected_magic,
                actual: frame[MAGIC_OFFSET],
            });
        }

        let mut sequence = [0u8; 4];
        sequence.copy_from_slice(&frame[SEQUENCE_OFFSET..UPTIME_OFFSET]);
        let mut uptime = [0u8; 4];
        uptime.copy_from_slice(&frame[UPTIME_OFFSET..PROBE_FRAME_LEN]);

        Ok(Self {
            magic: frame[MAGIC_OFFSET],
            sequence: u32::from_le_bytes(sequence),
            sender_uptime_ms: u32::from_le_bytes(uptime),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
