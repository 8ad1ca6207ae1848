//! Outbound ports: what the dispatcher and client call out to.

use async_trait::async_trait;

use crate::domain::{CallbackId, OutboundRequest, TransportError};

/// Writes stamped requests to the transport.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<(), TransportError>;
}

/// Observer for responses whose callback id has no pending entry.
///
/// Called on the reader's context; implementations must not block.
pub trait UnmatchedResponseHook: Send + Sync {
    fn on_unmatched(&self, callback_id: CallbackId);
}

impl<F> UnmatchedResponseHook for F
where
    F: Fn(CallbackId) + Send + Sync,
{
    fn on_unmatched(&self, callback_id: CallbackId) {
        self(callback_id)
    }
}
