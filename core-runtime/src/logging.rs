//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack. Every reconciliation state
//! transition is reported as a discrete log line identifying the relative
//! path and action; failures carry the path and the underlying cause.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default().with_format(LogFormat::Json);
//! init_logging(config)?;
//! tracing::info!("daemon started");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Compact;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum level for our crates ("trace".."error")
    pub level: String,
    /// Custom filter string overriding the default
    /// (e.g., "core_sync=trace,provider_google_drive=debug")
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = if let Some(custom) = &config.filter {
        custom.clone()
    } else {
        // Our crates at the configured level, noisy dependencies at warn.
        format!(
            "syncd={level},core_runtime={level},core_auth={level},core_sync={level},\
             provider_google_drive={level},bridge_desktop={level},\
             h2=warn,hyper=warn,reqwest=warn,notify=warn",
            level = config.level
        )
    };

    EnvFilter::try_new(filter_string).map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Initialize the logging system
///
/// Call once during startup; subsequent calls return an error.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let init_result = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    init_result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level("debug")
            .with_filter("core_sync=trace");

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "debug");
        assert_eq!(config.filter, Some("core_sync=trace".to_string()));
    }

    #[test]
    fn test_build_default_filter() {
        let config = LoggingConfig::default().with_level("debug");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_sync=debug"));
        assert!(filter.to_string().contains("hyper=warn"));
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("core_sync=trace");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_sync=trace"));
    }
}
