//! Prometheus metrics for the callback dispatcher.
//!
//! All metrics follow the naming convention: `glide_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Crate-local metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Units of work registered with a callback id
    pub static ref CALLBACKS_REGISTERED: IntCounter = IntCounter::new(
        "glide_dispatch_callbacks_registered_total",
        "Total number of callbacks registered"
    ).expect("metric creation failed");

    /// Units of work resolved by a matching response
    pub static ref CALLBACKS_COMPLETED: IntCounter = IntCounter::new(
        "glide_dispatch_callbacks_completed_total",
        "Total number of callbacks resolved by a response"
    ).expect("metric creation failed");

    /// Units of work cancelled by shutdown
    pub static ref CALLBACKS_CANCELLED: IntCounter = IntCounter::new(
        "glide_dispatch_callbacks_cancelled_total",
        "Total number of callbacks cancelled on shutdown"
    ).expect("metric creation failed");

    /// Responses whose callback id had no pending entry
    pub static ref UNMATCHED_RESPONSES: IntCounter = IntCounter::new(
        "glide_dispatch_unmatched_responses_total",
        "Total number of responses with no pending callback"
    ).expect("metric creation failed");

    /// Callbacks currently outstanding
    pub static ref CALLBACKS_PENDING: IntGauge = IntGauge::new(
        "glide_dispatch_callbacks_pending",
        "Number of callbacks awaiting a response"
    ).expect("metric creation failed");
}

/// Proof that the dispatcher metrics are registered on [`REGISTRY`].
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(CALLBACKS_REGISTERED.clone()),
        Box::new(CALLBACKS_COMPLETED.clone()),
        Box::new(CALLBACKS_CANCELLED.clone()),
        Box::new(UNMATCHED_RESPONSES.clone()),
        Box::new(CALLBACKS_PENDING.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Render every registered metric in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
