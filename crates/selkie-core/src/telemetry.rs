//! Telemetry and observability infrastructure
//!
//! TigerStyle: Explicit telemetry configuration with bounded resource usage.

use crate::error::{Error, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for tracing
    pub service_name: String,
    /// Whether to output traces to stdout
    pub stdout_enabled: bool,
    /// Log level filter
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "selkie".to_string(),
            stdout_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration with the given service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Disable stdout tracing
    pub fn without_stdout(mut self) -> Self {
        self.stdout_enabled = false;
        self
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - `SELKIE_SERVICE_NAME`: Service name (default: "selkie")
    /// - `RUST_LOG`: Log level filter (default: "info")
    pub fn from_env() -> Self {
        let service_name =
            std::env::var("SELKIE_SERVICE_NAME").unwrap_or_else(|_| "selkie".to_string());
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            service_name,
            stdout_enabled: true,
            log_level,
        }
    }
}

/// Initialize telemetry
///
/// Sets up a tracing subscriber with an env filter and optional stdout
/// formatting layer.
///
/// # Example
///
/// ```rust,ignore
/// use selkie_core::telemetry::{init_telemetry, TelemetryConfig};
///
/// let config = TelemetryConfig::new("my-service").with_log_level("debug");
/// init_telemetry(&config)?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.stdout_enabled {
        Some(tracing_subscriber::fmt::layer())
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Internal {
            reason: format!("failed to initialize tracing subscriber: {}", e),
        })?;

    tracing::info!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}
