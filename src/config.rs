//! SDK configuration
//!
//! Loaded from a TOML file, with `.env` and process environment overrides for
//! the node connection (`ALGOD_SERVER`, `ALGOD_TOKEN`, `ALGOD_TIMEOUT_SECS`).

use crate::transport::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_SERVER: &str = "ALGOD_SERVER";
pub const ENV_TOKEN: &str = "ALGOD_TOKEN";
pub const ENV_TIMEOUT: &str = "ALGOD_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Main SDK configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SdkConfig {
    #[serde(default)]
    pub node: NodeConfig,

    /// Transport retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    #[serde(default)]
    pub composer: ComposerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_url")]
    pub url: String,

    /// API token, sent as `X-Algo-API-Token`
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Wall-clock pause between pending-status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Round budget used when a send does not specify one. When unset the
    /// budget comes from the group's validity window.
    #[serde(default)]
    pub max_rounds_to_wait: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    #[serde(default = "default_validity_window")]
    pub default_validity_window: u64,

    /// Window used on local development networks
    #[serde(default = "default_localnet_validity_window")]
    pub localnet_validity_window: u64,
}

fn default_node_url() -> String { "http://localhost:4001".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_poll_interval() -> u64 { 1_000 }
fn default_validity_window() -> u64 { 10 }
fn default_localnet_validity_window() -> u64 { 1_000 }

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: default_node_url(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_rounds_to_wait: None,
        }
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            default_validity_window: default_validity_window(),
            localnet_validity_window: default_localnet_validity_window(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: SdkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus `.env` and environment overrides, no file
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER) {
            self.node.url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.node.token = Some(token);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.node.timeout_secs = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT.to_string(),
                message: format!("'{}' is not a number of seconds", timeout),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.url.trim().is_empty() {
            return Err(invalid("node.url", "must not be empty"));
        }
        if self.node.timeout_secs == 0 {
            return Err(invalid("node.timeout_secs", "must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.max_backoff_ms < self.retry.base_backoff_ms {
            return Err(invalid("retry.max_backoff_ms", "must not be below base_backoff_ms"));
        }
        if self.confirmation.poll_interval_ms == 0 {
            return Err(invalid("confirmation.poll_interval_ms", "must be positive"));
        }
        if self.composer.default_validity_window == 0 || self.composer.localnet_validity_window == 0 {
            return Err(invalid("composer", "validity windows must be positive"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
