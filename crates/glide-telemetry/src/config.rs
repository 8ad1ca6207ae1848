//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

use crate::Level;

/// Configuration for logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Minimum level that is emitted
    pub level: Level,

    /// Raw filter directive (`EnvFilter` syntax). Overrides `level` when set.
    pub filter: Option<String>,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "glide".to_string(),
            level: Level::Warn,
            filter: None,
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GLIDE_SERVICE_NAME`: Service name (default: glide)
    /// - `GLIDE_LOG_LEVEL`: One of error, warn, info, debug, trace, off (default: warn)
    /// - `RUST_LOG`: Full filter directive, used verbatim when present
    /// - `GLIDE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `GLIDE_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("GLIDE_SERVICE_NAME").unwrap_or_else(|_| "glide".to_string()),

            level: env::var("GLIDE_LOG_LEVEL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Level::Warn),

            filter: env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty()),

            console_output: env::var("GLIDE_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("GLIDE_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Filter directive handed to `EnvFilter`.
    pub fn filter_directive(&self) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None => self.level.as_str().to_string(),
        }
    }
}
