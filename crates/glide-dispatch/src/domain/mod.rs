//! Domain types for the callback dispatcher.
//!
//! Pure data structures and the concurrent pool/registry primitives. No
//! transport or runtime dependencies beyond `tokio::sync::oneshot`.

pub mod config;
pub mod error;
pub mod ids;
pub mod message;
pub mod pending;
pub mod phase;

// Re-exports for convenience
pub use config::{ConfigError, DispatchConfig};
pub use error::{DispatchError, DispatchResult, RequestErrorKind, TransportError};
pub use ids::{CallbackId, CallbackIdPool, CALLBACK_ID_SPACE};
pub use message::{OutboundRequest, RequestKind, Response, ResponseOutcome};
pub use pending::{
    DispatchStats, DispatchStatsSnapshot, PendingCallback, PendingCallbacks, ResponseHandle,
};
pub use phase::ConnectionPhase;
