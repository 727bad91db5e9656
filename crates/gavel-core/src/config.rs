//! Configuration system for Gavel.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $GAVEL_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/gavel/config.toml
//!   3. ~/.config/gavel/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::wire::{
    BROADCAST_TIMEOUT_MS, HEARTBEAT_INTERVAL_SECS, MEMBERSHIP_REFRESH_SECS, PEER_TTL_SECS,
    SWEEP_INTERVAL_SECS,
};

/// Top-level configuration, shared by `gaveld` and `gavel-directory`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GavelConfig {
    pub identity: IdentityConfig,
    pub network: NetworkConfig,
    pub directory: DirectoryConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// JSON seed store. Seeds are generated on first run.
    pub seed_store_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the node accepts peer RPC on. Port 0 = OS-assigned.
    pub listen_addr: String,
    /// Address announced to the directory. Empty = the bound listen address.
    pub advertise_addr: String,
    /// Presence directory to heartbeat against.
    pub directory_addr: String,
    /// Loopback port of the operator HTTP API.
    pub api_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Address the presence directory listens on.
    pub listen_addr: String,
    /// Seed store for the directory's own identity.
    pub seed_store_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub heartbeat_secs: u64,
    pub membership_refresh_secs: u64,
    pub sweep_secs: u64,
    pub peer_ttl_secs: u64,
    pub broadcast_timeout_ms: u64,
}

impl TimingConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn membership_refresh(&self) -> Duration {
        Duration::from_secs(self.membership_refresh_secs)
    }

    pub fn sweep(&self) -> Duration {
        Duration::from_secs(self.sweep_secs)
    }

    pub fn peer_ttl(&self) -> Duration {
        Duration::from_secs(self.peer_ttl_secs)
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            seed_store_path: data_dir().join("node-seeds.json"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".to_string(),
            advertise_addr: String::new(),
            directory_addr: "127.0.0.1:7400".to_string(),
            api_port: 9101,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7400".to_string(),
            seed_store_path: data_dir().join("directory-seeds.json"),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: HEARTBEAT_INTERVAL_SECS,
            membership_refresh_secs: MEMBERSHIP_REFRESH_SECS,
            sweep_secs: SWEEP_INTERVAL_SECS,
            peer_ttl_secs: PEER_TTL_SECS,
            broadcast_timeout_ms: BROADCAST_TIMEOUT_MS,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("gavel")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("gavel")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl GavelConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            GavelConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("GAVEL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&GavelConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply GAVEL_* overrides. `lookup` resolves a variable name.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("GAVEL_IDENTITY__SEED_STORE_PATH") {
            self.identity.seed_store_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("GAVEL_NETWORK__LISTEN_ADDR") {
            self.network.listen_addr = v;
        }
        if let Some(v) = lookup("GAVEL_NETWORK__ADVERTISE_ADDR") {
            self.network.advertise_addr = v;
        }
        if let Some(v) = lookup("GAVEL_NETWORK__DIRECTORY_ADDR") {
            self.network.directory_addr = v;
        }
        if let Some(p) = lookup("GAVEL_NETWORK__API_PORT").and_then(|v| v.parse().ok()) {
            self.network.api_port = p;
        }
        if let Some(v) = lookup("GAVEL_DIRECTORY__LISTEN_ADDR") {
            self.directory.listen_addr = v;
        }
        if let Some(ms) = lookup("GAVEL_TIMING__BROADCAST_TIMEOUT_MS").and_then(|v| v.parse().ok())
        {
            self.timing.broadcast_timeout_ms = ms;
        }
    }
}
