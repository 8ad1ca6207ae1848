//! Messages exchanged with the transport.
//!
//! Bodies are opaque bytes; encoding them is the caller's business. The only
//! field this crate reads or writes is the callback id.

use bytes::Bytes;

use crate::domain::error::RequestErrorKind;
use crate::domain::ids::CallbackId;

/// Which phase a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Identity negotiation sent once per connection
    Connection,
    /// Ordinary command
    Command,
}

/// A request stamped with its callback id, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub callback_id: CallbackId,
    pub kind: RequestKind,
    pub body: Bytes,
}

impl OutboundRequest {
    pub fn connection(callback_id: CallbackId, body: impl Into<Bytes>) -> Self {
        Self {
            callback_id,
            kind: RequestKind::Connection,
            body: body.into(),
        }
    }

    pub fn command(callback_id: CallbackId, body: impl Into<Bytes>) -> Self {
        Self {
            callback_id,
            kind: RequestKind::Command,
            body: body.into(),
        }
    }
}

/// What the core answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Constant OK reply
    Ok,
    /// Encoded reply value
    Value(Bytes),
    /// The request failed inside the core
    RequestError {
        kind: RequestErrorKind,
        message: String,
    },
    /// The core is closing the connection
    ClosingError(String),
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub callback_id: CallbackId,
    pub outcome: ResponseOutcome,
}

impl Response {
    pub fn ok(callback_id: CallbackId) -> Self {
        Self {
            callback_id,
            outcome: ResponseOutcome::Ok,
        }
    }

    pub fn value(callback_id: CallbackId, value: impl Into<Bytes>) -> Self {
        Self {
            callback_id,
            outcome: ResponseOutcome::Value(value.into()),
        }
    }

    pub fn request_error(
        callback_id: CallbackId,
        kind: RequestErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            callback_id,
            outcome: ResponseOutcome::RequestError {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn closing_error(callback_id: CallbackId, message: impl Into<String>) -> Self {
        Self {
            callback_id,
            outcome: ResponseOutcome::ClosingError(message.into()),
        }
    }
}
