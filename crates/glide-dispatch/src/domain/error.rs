//! Dispatch and transport error types.

use std::time::Duration;

use thiserror::Error;

use crate::domain::ids::CallbackId;

/// Result alias for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors surfaced to callers of the dispatcher.
///
/// Every failure local to the correlation layer either resolves a caller's
/// handle with one of these or is logged; none of them abort the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The dispatcher was shut down before (or while) the request was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// Commands were submitted before the handshake completed.
    #[error("connection not established")]
    NotConnected,

    /// Every callback id below the configured limit is outstanding.
    #[error("all {limit} callback ids are in use")]
    CallbackIdsExhausted { limit: u64 },

    /// An id handed out by the pool was already pending.
    #[error("callback id {0} is already pending")]
    DuplicateCallbackId(CallbackId),

    /// The core answered the request with an error.
    #[error("{kind:?} request error: {message}")]
    Request {
        kind: RequestErrorKind,
        message: String,
    },

    /// The core is closing the connection.
    #[error("connection closing: {0}")]
    Closing(String),

    /// The request could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The caller stopped waiting.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The handshake response was not a plain OK.
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),
}

impl DispatchError {
    /// Whether the error means the connection is unusable from now on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::Closing(_) | Self::HandshakeRejected(_)
        )
    }
}

/// Classification of request-level errors reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestErrorKind {
    Unspecified,
    ExecAbort,
    Timeout,
    Disconnect,
}

/// Errors from the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("channel closed")]
    ChannelClosed,
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

impl From<TransportError> for DispatchError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::ChannelClosed => DispatchError::ConnectionClosed,
            other => DispatchError::Transport(other.to_string()),
        }
    }
}
