//! Transport-facing plumbing: the reader loop and an in-memory transport.

pub mod channel;
pub mod listener;

pub use channel::{create_channel, ChannelReceiver, ChannelSender, CoreEndpoint};
pub use listener::{ListenerExit, ResponseListener, MAX_CONSECUTIVE_RECEIVE_ERRORS};
