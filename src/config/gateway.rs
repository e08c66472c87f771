// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::reports::{CorrelationConfig, UnmatchedPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default report-source endpoint for the location network
pub const DEFAULT_UPSTREAM_URL: &str = "https://gateway.icloud.com/acsnservice/fetch";

/// Upstream report source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: String,
    /// Operator-supplied account identifier
    pub username: Option<String>,
    /// Operator-supplied search token
    pub token: Option<String>,
    /// How far back to request reports
    pub window_hours: u32,
    pub timeout_secs: u64,
    /// Read batches from this file instead of the network
    pub batch_file: Option<PathBuf>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            username: None,
            token: None,
            window_hours: 1,
            timeout_secs: 30,
            batch_file: None,
        }
    }
}

/// Periodic sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_secs: u64,
    /// Cycles requested sooner than this after the previous one are refused
    pub min_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            min_interval_secs: 60,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }
}

/// Correlation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    /// Omit identifiers with no registered key instead of rejecting the batch
    pub skip_unmatched: bool,
    pub parallel: bool,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            skip_unmatched: false,
            parallel: true,
        }
    }
}

impl CorrelationSettings {
    pub fn to_config(&self) -> CorrelationConfig {
        CorrelationConfig {
            unmatched_policy: if self.skip_unmatched {
                UnmatchedPolicy::Omit
            } else {
                UnmatchedPolicy::Reject
            },
            parallel: self.parallel,
        }
    }
}

/// Key source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// File with one private key per line, optionally followed by a name
    pub keys_file: Option<PathBuf>,
}

/// Gateway configuration
///
/// ```toml
/// [upstream]
/// url = "https://gateway.icloud.com/acsnservice/fetch"
/// window_hours = 1
///
/// [sync]
/// interval_secs = 300
///
/// [correlation]
/// skip_unmatched = true
///
/// [keys]
/// keys_file = "keys/devices.txt"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub upstream: UpstreamConfig,
    pub sync: SyncConfig,
    pub correlation: CorrelationSettings,
    pub keys: KeysConfig,
}

impl GatewayConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse gateway configuration")
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load a config file (defaults when `None`), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override settings from environment variables (after loading `.env`)
    pub fn apply_env(&mut self) {
        dotenv::dotenv().ok();

        if let Ok(val) = std::env::var("UPSTREAM_URL") {
            self.upstream.url = val;
        }
        if let Ok(val) = std::env::var("UPSTREAM_USERNAME") {
            self.upstream.username = Some(val);
        }
        if let Ok(val) = std::env::var("UPSTREAM_TOKEN") {
            self.upstream.token = Some(val);
        }
        if let Ok(val) = std::env::var("UPSTREAM_BATCH_FILE") {
            self.upstream.batch_file = Some(PathBuf::from(val));
        }
        if let Some(num) = env_parse("REPORT_WINDOW_HOURS") {
            self.upstream.window_hours = num;
        }
        if let Some(num) = env_parse("SYNC_INTERVAL_SECS") {
            self.sync.interval_secs = num;
        }
        if let Some(num) = env_parse("SYNC_MIN_INTERVAL_SECS") {
            self.sync.min_interval_secs = num;
        }
        if let Some(flag) = env_parse("SKIP_UNMATCHED") {
            self.correlation.skip_unmatched = flag;
        }
        if let Ok(val) = std::env::var("KEYS_FILE") {
            self.keys.keys_file = Some(PathBuf::from(val));
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
