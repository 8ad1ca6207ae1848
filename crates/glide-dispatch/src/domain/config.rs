//! Dispatcher configuration with validation.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ids::CALLBACK_ID_SPACE;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid callback id limit: {0}")]
    InvalidCallbackIdLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid channel capacity: {0}")]
    InvalidCapacity(String),
}

/// Dispatcher and client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of distinct callback ids. Also bounds how many requests
    /// can be outstanding at once.
    pub callback_id_limit: u64,
    /// Caller-side timeout for commands. `None` waits until shutdown.
    #[serde(with = "opt_millis")]
    pub request_timeout: Option<Duration>,
    /// Caller-side timeout for the handshake.
    #[serde(with = "opt_millis")]
    pub handshake_timeout: Option<Duration>,
    /// Buffer size of the in-memory transport channels.
    pub response_channel_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            callback_id_limit: CALLBACK_ID_SPACE,
            request_timeout: None,
            handshake_timeout: Some(Duration::from_secs(10)),
            response_channel_capacity: 1024,
        }
    }
}

impl DispatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.callback_id_limit == 0 {
            return Err(ConfigError::InvalidCallbackIdLimit(
                "callback_id_limit cannot be 0".into(),
            ));
        }
        if self.callback_id_limit > CALLBACK_ID_SPACE {
            return Err(ConfigError::InvalidCallbackIdLimit(format!(
                "callback_id_limit {} exceeds the 32-bit id space",
                self.callback_id_limit
            )));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }
        if self.handshake_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout(
                "handshake_timeout cannot be 0".into(),
            ));
        }
        if self.response_channel_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "response_channel_capacity cannot be 0".into(),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by environment variables, then validated.
    ///
    /// - `GLIDE_CALLBACK_ID_LIMIT`
    /// - `GLIDE_REQUEST_TIMEOUT_MS` (0 disables the timeout)
    /// - `GLIDE_HANDSHAKE_TIMEOUT_MS` (0 disables the timeout)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let callback_id_limit = match lookup("GLIDE_CALLBACK_ID_LIMIT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::InvalidCallbackIdLimit(format!(
                    "GLIDE_CALLBACK_ID_LIMIT is not a number: {:?}",
                    raw
                ))
            })?,
            None => defaults.callback_id_limit,
        };
        let config = Self {
            callback_id_limit,
            request_timeout: lookup_millis(&lookup, "GLIDE_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout),
            handshake_timeout: lookup_millis(&lookup, "GLIDE_HANDSHAKE_TIMEOUT_MS")?
                .unwrap_or(defaults.handshake_timeout),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }
}

/// `None` when unset, `Some(None)` when set to 0.
fn lookup_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Option<Duration>>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let millis: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidTimeout(format!("{} is not a number: {:?}", key, raw)))?;
    Ok(Some((millis > 0).then(|| Duration::from_millis(millis))))
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
