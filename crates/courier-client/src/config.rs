//! Client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (COURIER_*)
//! - TOML configuration file (`COURIER_CONFIG` or the default search paths)

use anyhow::{bail, Context, Result};
use courier_core::DEFAULT_TYPING_DELAY;
use courier_protocol::{codec::MAX_FRAME_SIZE, UserId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Paths searched, in order, when `COURIER_CONFIG` is unset.
const CONFIG_PATHS: [&str; 3] = [
    "courier.toml",
    "/etc/courier/courier.toml",
    "~/.config/courier/courier.toml",
];

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The local user.
    #[serde(default = "default_user_id")]
    pub user_id: Option<UserId>,

    /// Peer whose conversation is open at startup.
    #[serde(default = "default_active_peer")]
    pub active_peer: Option<UserId>,

    /// Typing indicator configuration.
    #[serde(default)]
    pub typing: TypingConfig,

    /// Broker stream codec configuration.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Typing indicator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Quiet period before the indicator is repainted, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Broker stream codec configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Longest accepted event line in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Exporter port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

// Default value functions
fn default_user_id() -> Option<UserId> {
    env_parse::<i64>("COURIER_USER_ID").map(UserId)
}

fn default_active_peer() -> Option<UserId> {
    env_parse::<i64>("COURIER_ACTIVE_PEER").map(UserId)
}

fn default_debounce_ms() -> u64 {
    env_parse("COURIER_TYPING_DEBOUNCE_MS").unwrap_or(DEFAULT_TYPING_DELAY.as_millis() as u64)
}

fn default_max_frame_size() -> usize {
    env_parse("COURIER_MAX_FRAME_SIZE").unwrap_or(MAX_FRAME_SIZE)
}

fn default_metrics_enabled() -> bool {
    env_parse("COURIER_METRICS").unwrap_or(false)
}

fn default_metrics_port() -> u16 {
    env_parse("COURIER_METRICS_PORT").unwrap_or(9090)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            active_peer: default_active_peer(),
            typing: TypingConfig::default(),
            codec: CodecConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl TypingConfig {
    /// The debounce delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration from `COURIER_CONFIG`, the default paths, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// `COURIER_CONFIG` names a file that cannot be read.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("COURIER_CONFIG") {
            let expanded = shellexpand::tilde(&path);
            return Self::from_file(expanded.as_ref());
        }

        for path in &CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the types cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.codec.max_frame_size == 0 {
            bail!("codec.max_frame_size must be positive");
        }
        if let (Some(me), Some(peer)) = (self.user_id, self.active_peer) {
            if me == peer {
                bail!("active_peer must differ from user_id ({me})");
            }
        }
        Ok(())
    }
}
