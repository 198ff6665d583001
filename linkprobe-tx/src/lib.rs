/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! linkprobe-tx – link-quality diagnostic transmitter
//!
//! Emits sequence-numbered probes to one radio peer at a fixed cadence,
//! counts the delivery verdicts the radio reports back asynchronously, and
//! turns them into periodic progress reports and (for bounded runs) one final
//! summary.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── wire          – 9-byte probe frame encode / decode
//! ├── aggregator    – shared sent / succeeded / failed counters
//! ├── scheduler/    – tick-driven probe scheduler + reports
//! ├── transport/    – radio seam (trait, peer address, simulated radio)
//! ├── clock         – wrapping millisecond clock
//! ├── config/       – YAML + defaults for one run
//! └── runner        – tokio driver loop for host runs
//! ```

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod runner;
pub mod scheduler;
pub mod transport;
pub mod wire;
