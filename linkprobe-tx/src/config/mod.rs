//! Probe run configuration.
//!
//! Everything here is fixed once the scheduler is initialised; nothing is
//! mutable at runtime.  Values come from built-in defaults, optionally
//! overridden by a YAML file and then by command-line flags.
//!
//! The expected YAML structure is (every key optional):
//! ```yaml
//! probe:
//!   interval_ms: 1000
//!   report_interval_ms: 10000
//!   grace_period_ms: 2000
//!   limit: 500            # omit for a continuous run
//!   magic: 170            # 0xAA
//! peer:
//!   address: "24:6F:28:AA:BB:CC"
//!   send_mode: unicast    # or broadcast
//! link:
//!   loss_percent: 5
//!   latency_ms: 20
//!   jitter_ms: 10
//!   seed: 42
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::transport::sim::LinkProfile;
use crate::transport::{PeerAddress, SendMode};
use crate::wire::DEFAULT_MAGIC;

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_PROBE_INTERVAL_MS: u32 = 1_000;
pub const DEFAULT_REPORT_INTERVAL_MS: u32 = 10_000;

/// Wait after the last bounded-run probe before the summary, so that late
/// outcomes are still counted.
pub const DEFAULT_GRACE_PERIOD_MS: u32 = 2_000;

/// Upper bound for the simulated link's latency and jitter.
pub const MAX_LINK_DELAY_MS: u64 = u32::MAX as u64;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    probe: ProbeSection,
    peer: PeerSection,
    link: LinkProfile,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProbeSection {
    interval_ms: u32,
    report_interval_ms: u32,
    grace_period_ms: u32,
    /// Absent → continuous run.
    limit: Option<u32>,
    magic: u8,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            limit: None,
            magic: DEFAULT_MAGIC,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PeerSection {
    address: Option<PeerAddress>,
    send_mode: SendMode,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Whether a run stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Never stops; periodic progress reports only.
    Continuous,
    /// Stops after `limit` probes and emits one final summary.
    Bounded { limit: u32 },
}

impl RunMode {
    pub fn limit(&self) -> Option<u32> {
        match self {
            RunMode::Continuous => None,
            RunMode::Bounded { limit } => Some(*limit),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Continuous => f.write_str("continuous"),
            RunMode::Bounded { limit } => write!(f, "bounded ({limit} probes)"),
        }
    }
}

/// Complete configuration for one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub mode: RunMode,
    /// `0` means "send on every tick".
    pub probe_interval_ms: u32,
    pub report_interval_ms: u32,
    pub grace_period_ms: u32,
    /// Sentinel written into every probe.
    pub magic: u8,
    /// Probe target.  Broadcast runs use [`PeerAddress::BROADCAST`].
    pub peer: PeerAddress,
    pub send_mode: SendMode,
    /// Simulated link used by host runs.
    pub link: LinkProfile,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Continuous,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            magic: DEFAULT_MAGIC,
            peer: PeerAddress::BROADCAST,
            send_mode: SendMode::Unicast,
            link: LinkProfile::default(),
        }
    }
}

impl ProbeConfig {
    /// Parse `path` into a validated configuration.
    ///
    /// Keys missing from the file keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, if the YAML is
    /// structurally invalid (including a malformed peer address or unknown
    /// keys), or if [`validate`](Self::validate) rejects a value.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading probe configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parse a YAML document (see the module docs for the layout).
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse YAML")?;

        let send_mode = file.peer.send_mode;
        let peer = match (send_mode, file.peer.address) {
            (_, Some(addr)) => addr,
            (SendMode::Broadcast, None) => PeerAddress::BROADCAST,
            (SendMode::Unicast, None) => {
                bail!("peer.address is required for unicast runs")
            }
        };

        let config = Self {
            mode: match file.probe.limit {
                Some(limit) => RunMode::Bounded { limit },
                None => RunMode::Continuous,
            },
            probe_interval_ms: file.probe.interval_ms,
            report_interval_ms: file.probe.report_interval_ms,
            grace_period_ms: file.probe.grace_period_ms,
            magic: file.probe.magic,
            peer,
            send_mode,
            link: file.link,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the run cannot honour; warn about odd but usable ones.
    pub fn validate(&self) -> Result<()> {
        if self.link.loss_percent > 100 {
            bail!(
                "link.loss_percent must be between 0 and 100, got {}",
                self.link.loss_percent
            );
        }
        if self.link.latency_ms > MAX_LINK_DELAY_MS || self.link.jitter_ms > MAX_LINK_DELAY_MS {
            bail!(
                "link.latency_ms and link.jitter_ms must not exceed {} ms, got {} / {}",
                MAX_LINK_DELAY_MS,
                self.link.latency_ms,
                self.link.jitter_ms
            );
        }
        if self.send_mode == SendMode::Unicast && self.peer.is_broadcast() {
            bail!("unicast runs need a concrete peer address, not {}", self.peer);
        }
        if self.report_interval_ms == 0 {
            warn!("report_interval_ms is 0 – a progress report will be emitted on every tick");
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── ProbeConfig::load_from_file ───────────────────────────────────────────

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
probe:
  interval_ms: 250
  report_interval_ms: 5000
  grace_period_ms: 1500
  limit: 100
  magic: 85
peer:
  address: "24:6F:28:AA:BB:CC"
  send_mode: unicast
link:
  loss_percent: 5
  latency_ms: 20
  jitter_ms: 10
  seed: 42
"#;
        let f = yaml_tempfile(yaml);
        let cfg = ProbeConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.mode, RunMode::Bounded { limit: 100 });
        assert_eq!(cfg.probe_interval_ms, 250);
        assert_eq!(cfg.report_interval_ms, 5_000);
        assert_eq!(cfg.grace_period_ms, 1_500);
        assert_eq!(cfg.magic, 0x55);
        assert_eq!(cfg.peer.to_string(), "24:6F:28:AA:BB:CC");
        assert_eq!(cfg.send_mode, SendMode::Unicast);
        assert_eq!(
            cfg.link,
            LinkProfile {
                loss_percent: 5,
                latency_ms: 20,
                jitter_ms: 10,
                seed: 42
            }
        );
    }

    #[test]
    fn absent_keys_use_defaults() {
        let cfg = ProbeConfig::from_yaml("peer:\n  address: \"01:02:03:04:05:06\"\n").unwrap();
        assert_eq!(cfg.mode, RunMode::Continuous);
        assert_eq!(cfg.probe_interval_ms, DEFAULT_PROBE_INTERVAL_MS);
        assert_eq!(cfg.report_interval_ms, DEFAULT_REPORT_INTERVAL_MS);
        assert_eq!(cfg.grace_period_ms, DEFAULT_GRACE_PERIOD_MS);
        assert_eq!(cfg.magic, DEFAULT_MAGIC);
        assert_eq!(cfg.link, LinkProfile::default());
    }

    #[test]
    fn broadcast_without_address_targets_broadcast_peer() {
        let cfg = ProbeConfig::from_yaml("peer:\n  send_mode: broadcast\n").unwrap();
        assert_eq!(cfg.send_mode, SendMode::Broadcast);
        assert!(cfg.peer.is_broadcast());
    }

    #[test]
    fn unicast_without_address_is_rejected() {
        assert!(ProbeConfig::from_yaml("probe:\n  limit: 3\n").is_err());
    }

    #[test]
    fn bounded_limit_zero_is_accepted() {
        let yaml = "probe:\n  limit: 0\npeer:\n  send_mode: broadcast\n";
        let cfg = ProbeConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.mode, RunMode::Bounded { limit: 0 });
    }

    #[test]
    fn missing_file_returns_error() {
        let result = ProbeConfig::load_from_file(Path::new("/nonexistent/path/probe.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(ProbeConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn malformed_peer_address_returns_error() {
        let err = ProbeConfig::from_yaml("peer:\n  address: \"not-a-mac\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("not-a-mac"), "{err:#}");
    }

    #[test]
    fn unknown_key_returns_error() {
        assert!(ProbeConfig::from_yaml("probe:\n  intervall_ms: 5\n").is_err());
    }

    // ── ProbeConfig::validate ─────────────────────────────────────────────────

    #[test]
    fn loss_above_hundred_percent_is_rejected() {
        let yaml = "peer:\n  send_mode: broadcast\nlink:\n  loss_percent: 101\n";
        assert!(ProbeConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn oversized_jitter_is_rejected() {
        let yaml = "peer:\n  send_mode: broadcast\nlink:\n  jitter_ms: 18446744073709551615\n";
        assert!(ProbeConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn oversized_latency_is_rejected() {
        let mut cfg = ProbeConfig::default();
        cfg.peer = "24:6F:28:AA:BB:CC".parse().unwrap();
        cfg.link.latency_ms = u64::MAX;
        assert!(cfg.validate().is_err());

        cfg.link.latency_ms = MAX_LINK_DELAY_MS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_config_fails_validation_until_a_peer_is_set() {
        let mut cfg = ProbeConfig::default();
        assert!(cfg.validate().is_err());
        cfg.peer = "24:6F:28:AA:BB:CC".parse().unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_report_interval_is_only_a_warning() {
        let yaml = "probe:\n  report_interval_ms: 0\npeer:\n  send_mode: broadcast\n";
        assert_eq!(ProbeConfig::from_yaml(yaml).unwrap().report_interval_ms, 0);
    }

    // ── RunMode ───────────────────────────────────────────────────────────────

    #[test]
    fn run_mode_limit_and_display() {
        assert_eq!(RunMode::Continuous.limit(), None);
        assert_eq!(RunMode::Bounded { limit: 7 }.limit(), Some(7));
        assert_eq!(RunMode::Bounded { limit: 7 }.to_string(), "bounded (7 probes)");
    }
}
