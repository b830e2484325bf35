//! Configuration loading from TOML files.
//!
//! A config file is optional: every field has a default matching the
//! dashboard's stock deployment, so `Config::default()` is a working setup
//! pointed at localhost.

use serde::Deserialize;
use std::path::Path;

use crate::backoff::ReconnectPolicy;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL of the admin API.
    pub api_url: String,
    /// Path of the push-subscription endpoint, relative to `api_url`.
    pub stream_path: String,
}

/// Knobs for the telemetry session itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Polling fallback interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum retained throughput / error-rate samples.
    pub max_samples: usize,
    /// Maximum retained job lifecycle events.
    pub max_events: usize,
    /// Consecutive stream-open failures tolerated before falling back to
    /// polling for the rest of the session.
    pub max_reconnect_attempts: u32,
    /// When false the session starts idle and holds no resources.
    pub enabled: bool,
    pub reconnect: ReconnectPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.network.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "network.api_url",
                reason: "cannot be empty".into(),
            }
            .into());
        }
        if self.telemetry.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.poll_interval_ms",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        if self.telemetry.max_samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.max_samples",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.logging.level.clone()));

        if self.logging.format == "json" {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        } else {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".into(),
            stream_path: "/ojs/v1/admin/stats/stream".into(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3_000,
            max_samples: 60,
            max_events: 200,
            max_reconnect_attempts: 10,
            enabled: true,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}
