//! Ports to the transport collaborator.

pub mod inbound;
pub mod outbound;

pub use inbound::ResponseReceiver;
pub use outbound::{RequestSender, UnmatchedResponseHook};
