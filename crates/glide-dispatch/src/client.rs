//! Caller-side wrapper: register, send, await.
//!
//! The dispatcher itself never waits and never times out. This client is the
//! layer that owns the transport writer and the optional timeouts.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::domain::{
    CallbackId, DispatchConfig, DispatchError, DispatchResult, OutboundRequest, ResponseHandle,
    ResponseOutcome,
};
use crate::ports::RequestSender;
use crate::service::CallbackDispatcher;

/// Sends requests over a shared transport and awaits their correlated replies.
pub struct DispatchClient {
    dispatcher: Arc<CallbackDispatcher<ResponseOutcome>>,
    sender: Arc<dyn RequestSender>,
    request_timeout: Option<Duration>,
    handshake_timeout: Option<Duration>,
}

impl DispatchClient {
    pub fn new(
        dispatcher: Arc<CallbackDispatcher<ResponseOutcome>>,
        sender: Arc<dyn RequestSender>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            dispatcher,
            sender,
            request_timeout: config.request_timeout,
            handshake_timeout: config.handshake_timeout,
        }
    }

    /// Perform the handshake. Commands are rejected until this succeeds.
    pub async fn connect(&self, body: impl Into<Bytes>) -> DispatchResult<()> {
        let (callback_id, handle) = self.dispatcher.register_connection()?;
        self.send(OutboundRequest::connection(callback_id, body))
            .await?;

        match self.wait(handle, self.handshake_timeout).await? {
            ResponseOutcome::Ok => {
                self.dispatcher.mark_connected();
                Ok(())
            }
            other => {
                warn!(callback_id = %callback_id, "Handshake rejected");
                Err(DispatchError::HandshakeRejected(format!("{:?}", other)))
            }
        }
    }

    /// Send a command and wait for its reply.
    ///
    /// Returns `None` for a plain OK reply and the encoded value otherwise.
    pub async fn execute(&self, body: impl Into<Bytes>) -> DispatchResult<Option<Bytes>> {
        if self.dispatcher.is_closed() {
            return Err(DispatchError::ConnectionClosed);
        }
        if !self.dispatcher.is_connected() {
            return Err(DispatchError::NotConnected);
        }

        let (callback_id, handle) = self.dispatcher.submit()?;
        self.send(OutboundRequest::command(callback_id, body))
            .await?;

        match self.wait(handle, self.request_timeout).await? {
            ResponseOutcome::Ok => Ok(None),
            ResponseOutcome::Value(value) => Ok(Some(value)),
            ResponseOutcome::RequestError { kind, message } => {
                Err(DispatchError::Request { kind, message })
            }
            ResponseOutcome::ClosingError(message) => Err(DispatchError::Closing(message)),
        }
    }

    async fn send(&self, request: OutboundRequest) -> DispatchResult<()> {
        let callback_id: CallbackId = request.callback_id;
        if let Err(e) = self.sender.send(request).await {
            // Never reached the core, so no response will ever come.
            self.dispatcher.withdraw(callback_id);
            return Err(e.into());
        }
        debug!(callback_id = %callback_id, "Sent request");
        Ok(())
    }

    async fn wait(
        &self,
        handle: ResponseHandle<ResponseOutcome>,
        timeout: Option<Duration>,
    ) -> DispatchResult<ResponseOutcome> {
        let callback_id = handle.callback_id();
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    // The entry stays pending; a late reply is resolved into
                    // the dropped handle and the id recycled then.
                    debug!(callback_id = %callback_id, "Stopped waiting for response");
                    Err(DispatchError::Timeout(limit))
                }
            },
            None => handle.await,
        }
    }

    /// Shut the dispatcher down, cancelling every outstanding request.
    pub fn close(&self) -> usize {
        self.dispatcher.shutdown()
    }

    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_connected()
    }

    pub fn dispatcher(&self) -> &Arc<CallbackDispatcher<ResponseOutcome>> {
        &self.dispatcher
    }
}
