//! # Verdant Observe - Structured Logging
//!
//! Logging initialization shared by every Verdant process.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development)
    Pretty,
    /// Compact format without colors
    Compact,
    /// JSON format (for production)
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("unknown log format: {}", other)),
        }
    }
}

#[allow(clippy::derivable_impls)]
impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        {
            LogFormat::Pretty
        }
        #[cfg(not(debug_assertions))]
        {
            LogFormat::Json
        }
    }
}

/// Configuration for logging behavior
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Whether to include file/line numbers
    pub include_location: bool,
    /// Whether to include target module
    pub include_target: bool,
    /// Environment filter (e.g., "info,verdant=debug")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            include_location: cfg!(debug_assertions),
            include_target: true,
            filter: None,
        }
    }
}

/// Initialize structured logging with configuration.
///
/// Safe to call once per process; a second call fails because the global
/// subscriber is already set.
pub fn init_logging(config: LogConfig) -> anyhow::Result<()> {
    let env_filter = if let Some(filter) = config.filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,verdant=debug"))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    match config.format {
        LogFormat::Pretty => {
            subscriber
                .pretty()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize pretty logger: {}", e))?;
        }
        LogFormat::Compact => {
            subscriber
                .compact()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize compact logger: {}", e))?;
        }
        LogFormat::Json => {
            subscriber
                .json()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logger: {}", e))?;
        }
    }

    tracing::info!(format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::default());
        assert!(config.include_target);
        assert!(config.filter.is_none());
    }
}
