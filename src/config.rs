use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::app::engine::{EngineSettings, Host, Timeouts};

pub const DEFAULT_HOSTS: [&str; 7] = [
    "media-server.local:3000",
    "192.168.0.10:3000",
    "192.168.1.10:3000",
    "192.168.0.100:3000",
    "192.168.1.100:3000",
    "10.0.2.2:3000",
    "127.0.0.1:3000",
];

/// On-disk settings; every field is optional and falls back to its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hosts: Vec<String>,
    pub next_timeout_ms: u64,
    pub blacklist_timeout_ms: u64,
    pub rewind_threshold_ms: u64,
    pub player_bin: String,
    pub playback_speed: f64,
    pub show_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.iter().map(|host| host.to_string()).collect(),
            next_timeout_ms: 2000,
            blacklist_timeout_ms: 3000,
            rewind_threshold_ms: 5000,
            player_bin: "mpv".to_string(),
            playback_speed: 1.0,
            show_log: true,
        }
    }
}

impl Config {
    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config at {}", path.display()));
            }
        };
        let config = Self::parse(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.hosts.retain(|host| !host.trim().is_empty());
        if config.hosts.is_empty() {
            config.hosts = Self::default().hosts;
        }
        if !(config.playback_speed.is_finite() && config.playback_speed > 0.0) {
            config.playback_speed = 1.0;
        }
        Ok(config)
    }

    /// Replaces the host list with the non-blank `hosts`, if there are any.
    pub fn with_host_override(mut self, hosts: &[String]) -> Self {
        let hosts: Vec<String> = hosts
            .iter()
            .filter(|host| !host.trim().is_empty())
            .cloned()
            .collect();
        if !hosts.is_empty() {
            self.hosts = hosts;
        }
        self
    }

    pub(crate) fn candidate_hosts(&self) -> Vec<Host> {
        self.hosts.iter().map(|host| Host::new(host.trim())).collect()
    }

    pub(crate) fn timeouts(&self) -> Timeouts {
        Timeouts {
            probe: Duration::from_millis(self.next_timeout_ms),
            blacklist: Duration::from_millis(self.blacklist_timeout_ms),
        }
    }

    pub(crate) fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            hosts: self.candidate_hosts(),
            timeouts: self.timeouts(),
            rewind_threshold_ms: self.rewind_threshold_ms,
            playback_speed: self.playback_speed,
        }
    }

    pub fn player_bin(&self) -> PathBuf {
        crate::app::engine::resolve_player_bin(&self.player_bin)
    }
}
