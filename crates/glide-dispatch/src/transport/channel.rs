//! In-memory transport over tokio channels.
//!
//! Stands in for the socket to the execution core in tests and demos. The
//! [`CoreEndpoint`] half plays the core: it reads stamped requests and writes
//! responses in whatever order it likes.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::domain::{OutboundRequest, Response, TransportError};
use crate::ports::{RequestSender, ResponseReceiver};

pub struct ChannelSender(pub mpsc::Sender<OutboundRequest>);

pub struct ChannelReceiver(Mutex<mpsc::Receiver<Response>>);

impl ChannelReceiver {
    pub fn new(receiver: mpsc::Receiver<Response>) -> Self {
        Self(Mutex::new(receiver))
    }
}

#[async_trait]
impl RequestSender for ChannelSender {
    async fn send(&self, request: OutboundRequest) -> Result<(), TransportError> {
        self.0
            .send(request)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

#[async_trait]
impl ResponseReceiver for ChannelReceiver {
    async fn receive(&self) -> Result<Response, TransportError> {
        let mut guard = self.0.lock().await;
        guard.recv().await.ok_or(TransportError::ChannelClosed)
    }
}

/// The core's side of an in-memory connection.
pub struct CoreEndpoint {
    pub requests: mpsc::Receiver<OutboundRequest>,
    pub responses: mpsc::Sender<Response>,
}

impl CoreEndpoint {
    /// Next request written by the client, or `None` once the client is gone.
    pub async fn next_request(&mut self) -> Option<OutboundRequest> {
        self.requests.recv().await
    }

    pub async fn respond(&self, response: Response) -> Result<(), TransportError> {
        self.responses
            .send(response)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Create a connected client/core channel pair.
pub fn create_channel(buffer: usize) -> (ChannelSender, ChannelReceiver, CoreEndpoint) {
    let (req_tx, req_rx) = mpsc::channel(buffer);
    let (resp_tx, resp_rx) = mpsc::channel(buffer);
    (
        ChannelSender(req_tx),
        ChannelReceiver::new(resp_rx),
        CoreEndpoint {
            requests: req_rx,
            responses: resp_tx,
        },
    )
}
