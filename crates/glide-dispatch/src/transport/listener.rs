//! Reader loop feeding inbound responses to the dispatcher.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::{DispatchError, Response, ResponseOutcome, TransportError};
use crate::ports::ResponseReceiver;
use crate::service::CallbackDispatcher;

/// Why the listener stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// The transport went away
    TransportClosed,
    /// The core sent a closing error
    ClosingError(String),
    /// Receiving kept failing; carries the last error
    ReceiveFailed(String),
}

/// Consecutive receive errors tolerated before the connection is given up.
pub const MAX_CONSECUTIVE_RECEIVE_ERRORS: u32 = 16;

/// Single reader context for one connection.
///
/// Routes every response to the dispatcher and shuts the dispatcher down when
/// the connection ends.
pub struct ResponseListener {
    dispatcher: Arc<CallbackDispatcher<ResponseOutcome>>,
    receiver: Arc<dyn ResponseReceiver>,
}

impl ResponseListener {
    pub fn new(
        dispatcher: Arc<CallbackDispatcher<ResponseOutcome>>,
        receiver: Arc<dyn ResponseReceiver>,
    ) -> Self {
        Self {
            dispatcher,
            receiver,
        }
    }

    /// Run the listener on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<ListenerExit> {
        tokio::spawn(self.run())
    }

    /// Run the listener loop until the connection ends.
    pub async fn run(self) -> ListenerExit {
        let mut failures = 0u32;
        loop {
            match self.receiver.receive().await {
                Ok(response) => {
                    failures = 0;
                    if let Some(exit) = self.handle_response(response) {
                        return exit;
                    }
                }
                Err(TransportError::ChannelClosed) => {
                    warn!("Transport closed, stopping response listener");
                    self.dispatcher.shutdown_with_reason("transport closed");
                    return ListenerExit::TransportClosed;
                }
                Err(e) => {
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_RECEIVE_ERRORS {
                        error!(error = %e, failures, "Giving up on response transport");
                        self.dispatcher.shutdown_with_reason("receive failed");
                        return ListenerExit::ReceiveFailed(e.to_string());
                    }
                    warn!(error = %e, failures, "Error receiving response");
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    fn handle_response(&self, response: Response) -> Option<ListenerExit> {
        let Response {
            callback_id,
            outcome,
        } = response;

        match outcome {
            ResponseOutcome::ClosingError(message) => {
                self.dispatcher
                    .on_error(callback_id, DispatchError::Closing(message.clone()));
                self.dispatcher.shutdown_with_reason(&message);
                Some(ListenerExit::ClosingError(message))
            }
            ResponseOutcome::RequestError { kind, message } => {
                self.dispatcher
                    .on_error(callback_id, DispatchError::Request { kind, message });
                None
            }
            outcome @ (ResponseOutcome::Ok | ResponseOutcome::Value(_)) => {
                if !self.dispatcher.on_response(callback_id, outcome) {
                    debug!(callback_id = %callback_id, "Dropped response with no pending callback");
                }
                None
            }
        }
    }
}
