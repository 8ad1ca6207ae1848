//! Connection phase gate.

use std::sync::atomic::{AtomicBool, Ordering};

/// Handshake vs steady-state flag for one connection.
///
/// Starts in the handshake phase and flips to connected once; it never goes
/// back. Readers use it to decide how to interpret arriving traffic.
#[derive(Debug, Default)]
pub struct ConnectionPhase {
    connected: AtomicBool,
}

impl ConnectionPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful handshake. Returns true only for the call that
    /// performed the transition.
    pub fn mark_connected(&self) -> bool {
        self.connected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
