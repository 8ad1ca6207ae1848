//! Inbound ports: where decoded responses come from.

use async_trait::async_trait;

use crate::domain::{Response, TransportError};

/// Yields responses decoded from the transport, in arrival order.
#[async_trait]
pub trait ResponseReceiver: Send + Sync {
    /// Wait for the next response. `ChannelClosed` means the transport is gone.
    async fn receive(&self) -> Result<Response, TransportError>;
}
