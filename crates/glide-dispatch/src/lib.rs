//! # Glide Dispatch
//!
//! Request/response correlation for a client that multiplexes every command
//! over one duplex transport to a separate execution core.
//!
//! # Architecture
//!
//! ```text
//!   callers ──submit()──► ┌──────────────────────────────┐
//!                         │      CallbackDispatcher      │
//!                         │  ┌──────────┐ ┌───────────┐  │
//!                         │  │ id pool  │ │  pending  │  │
//!                         │  │ (free +  │ │ callbacks │  │
//!                         │  │ counter) │ │ (dashmap) │  │
//!                         │  └──────────┘ └───────────┘  │
//!                         │        connection phase      │
//!                         └──────────────▲───────────────┘
//!                                        │ on_response()
//!   DispatchClient ──OutboundRequest──►  transport  ──Response──► ResponseListener
//! ```
//!
//! Every request is tagged with a [`CallbackId`]. The core echoes the id on
//! its response, which may arrive in any order. The dispatcher resolves the
//! matching [`ResponseHandle`], recycles the id, and on shutdown cancels
//! whatever is still outstanding.
//!
//! # Usage
//!
//! ```ignore
//! use glide_dispatch::{create_channel, CallbackDispatcher, DispatchClient, DispatchConfig, ResponseListener};
//!
//! let config = DispatchConfig::default();
//! let dispatcher = Arc::new(CallbackDispatcher::with_config(&config)?);
//! let (sender, receiver, core) = create_channel(config.response_channel_capacity);
//! ResponseListener::new(dispatcher.clone(), Arc::new(receiver)).spawn();
//!
//! let client = DispatchClient::new(dispatcher, Arc::new(sender), &config);
//! client.connect(hello).await?;
//! let reply = client.execute(command).await?;
//! ```
//!
//! # Callback id space
//!
//! Ids are 32-bit on the wire. The counter never wraps: when every id below
//! [`DispatchConfig::callback_id_limit`] is outstanding, `submit` returns
//! [`DispatchError::CallbackIdsExhausted`].

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod client;
pub mod domain;
pub mod ports;
pub mod service;
pub mod transport;

// Re-exports for public API
pub use client::DispatchClient;
pub use domain::{
    CallbackId, CallbackIdPool, ConfigError, ConnectionPhase, DispatchConfig, DispatchError,
    DispatchResult, DispatchStatsSnapshot, OutboundRequest, PendingCallbacks, RequestErrorKind,
    RequestKind, Response, ResponseHandle, ResponseOutcome, TransportError, CALLBACK_ID_SPACE,
};
pub use ports::{RequestSender, ResponseReceiver, UnmatchedResponseHook};
pub use service::CallbackDispatcher;
pub use transport::{create_channel, CoreEndpoint, ListenerExit, ResponseListener};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
