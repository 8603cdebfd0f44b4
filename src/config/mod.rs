use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::network::probe::{DEFAULT_PROBE_COUNT, DEFAULT_PROBE_HOST};

fn default_poll_interval() -> u64 {
    60
}

fn default_min_signal() -> i64 {
    10
}

fn default_probe_host() -> String {
    DEFAULT_PROBE_HOST.to_string()
}

fn default_probe_count() -> u32 {
    DEFAULT_PROBE_COUNT
}

fn default_verify_attempts() -> u32 {
    10
}

fn default_verify_pause() -> u64 {
    1
}

fn default_notifications() -> bool {
    true
}

/// Daemon tunables, read once at startup from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds between supervision cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Candidates must scan strictly above this signal value
    #[serde(default = "default_min_signal")]
    pub min_signal: i64,

    /// Host probed to decide whether the link has internet
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    /// Packets per reachability probe
    #[serde(default = "default_probe_count")]
    pub probe_count: u32,

    /// Post-join verification probes before a network counts as failed
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,

    /// Seconds between verification probes
    #[serde(default = "default_verify_pause")]
    pub verify_pause_secs: u64,

    /// Show desktop notifications on connect / connectivity loss
    #[serde(default = "default_notifications")]
    pub notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            min_signal: default_min_signal(),
            probe_host: default_probe_host(),
            probe_count: default_probe_count(),
            verify_attempts: default_verify_attempts(),
            verify_pause_secs: default_verify_pause(),
            notifications: default_notifications(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("roamu");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Resolved runtime settings: the config-file tunables plus the interface
/// chosen on the command line. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub poll_interval: Duration,
    pub min_signal: i64,
    pub probe_host: String,
    pub probe_count: u32,
    pub verify_attempts: u32,
    pub verify_pause: Duration,
    pub notifications: bool,
}

impl Settings {
    pub fn resolve(interface: String, config: &AppConfig) -> Self {
        Self {
            interface,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            min_signal: config.min_signal,
            probe_host: config.probe_host.clone(),
            probe_count: config.probe_count,
            verify_attempts: config.verify_attempts,
            verify_pause: Duration::from_secs(config.verify_pause_secs),
            notifications: config.notifications,
        }
    }
}
