//! # Verdant Config - Configuration Management
//!
//! Handles configuration loading from files and environment variables.

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// First-startup seeding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Identifier of the account to seed on first startup. When unset the
    /// server generates a well-known default.
    pub default_account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind ("memory")
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Connection string for externally hosted document services
    pub connection_string: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: default_backend(), connection_string: None }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Output format: "pretty", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Environment filter (e.g. "info,verdant=debug")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: default_log_format(), filter: None }
    }
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Config {
    /// Load configuration from an optional file plus `VERDANT_*` environment
    /// variables (environment wins).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("VERDANT").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".to_string()));
        }
        match self.log.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "log.format must be pretty, compact or json, got {}",
                    other
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.log.format, "compact");
        config.validate().unwrap();
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.store.backend, "memory");
    }

    #[test]
    fn empty_host_is_rejected() {
        let mut config = Config::default();
        config.server.host.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let mut config = Config::default();
        config.log.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log.format"));
    }
}
