//! # Integration Tests
//!
//! End-to-end flows through the client, the response listener and a
//! simulated execution core that answers out of order.

pub mod flows;
