//! # Glide Telemetry
//!
//! Logging and metrics for the Glide callback dispatcher.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use glide_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GLIDE_SERVICE_NAME` | `glide` | Service name in log lines |
//! | `GLIDE_LOG_LEVEL` | `warn` | Minimum log level |
//! | `RUST_LOG` | unset | Full filter directive, overrides `GLIDE_LOG_LEVEL` |
//! | `GLIDE_JSON_LOGS` | `false` | JSON formatted output |
//! | `GLIDE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, Level, LoggingHandle};
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, CALLBACKS_CANCELLED, CALLBACKS_COMPLETED,
    CALLBACKS_PENDING, CALLBACKS_REGISTERED, UNMATCHED_RESPONSES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Global logger already initialized")]
    AlreadyInitialized,

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and logging.
///
/// Metrics are always registered. A logger installed earlier in the process
/// is left in place.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;

    let logging = match init_logging(&config) {
        Ok(handle) => Some(handle),
        Err(TelemetryError::AlreadyInitialized) => None,
        Err(e) => return Err(e),
    };

    Ok(TelemetryGuard {
        _metrics: metrics,
        logging,
    })
}

/// Guard that keeps telemetry active for the lifetime of the client.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
    logging: Option<LoggingHandle>,
}

impl TelemetryGuard {
    /// Whether this call installed the global logger.
    pub fn installed_logger(&self) -> bool {
        self.logging.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Shutting down telemetry");
    }
}
