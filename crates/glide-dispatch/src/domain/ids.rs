//! Callback ids and the pool that hands them out.
//!
//! A callback id tags one in-flight request on the shared transport. The core
//! echoes it back on the response, which is the only way to find the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};

use crate::domain::error::DispatchError;

/// Number of distinct values the wire field can carry.
pub const CALLBACK_ID_SPACE: u64 = 1 << 32;

/// Transport-level identifier of an outstanding request.
///
/// Carried as a fixed-width `u32` on the wire. Peers that only have signed
/// 32-bit integers can use [`CallbackId::to_bits_i32`]; the bit pattern is
/// preserved either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(u32);

impl CallbackId {
    /// Id decoded from an inbound frame.
    pub const fn from_wire(raw: u32) -> Self {
        Self(raw)
    }

    /// Value to stamp into an outbound frame.
    pub const fn to_wire(self) -> u32 {
        self.0
    }

    pub const fn from_bits_i32(raw: i32) -> Self {
        Self(raw as u32)
    }

    pub const fn to_bits_i32(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CallbackId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<CallbackId> for u32 {
    fn from(id: CallbackId) -> Self {
        id.0
    }
}

/// Allocates callback ids, preferring recycled ones over fresh counter values.
///
/// The counter never wraps. Once `limit` distinct ids have been issued and
/// none are free, [`allocate`](Self::allocate) fails instead of reusing a
/// value that may still be outstanding.
pub struct CallbackIdPool {
    /// Next never-issued id
    next: AtomicU64,
    /// Exclusive upper bound on counter values
    limit: u64,
    /// Ids freed by completed or cancelled requests
    free: SegQueue<CallbackId>,
}

impl CallbackIdPool {
    pub fn new() -> Self {
        Self::with_limit(CALLBACK_ID_SPACE)
    }

    /// Pool issuing at most `limit` distinct ids (clamped to the wire width).
    pub fn with_limit(limit: u64) -> Self {
        Self {
            next: AtomicU64::new(0),
            limit: limit.min(CALLBACK_ID_SPACE),
            free: SegQueue::new(),
        }
    }

    pub fn allocate(&self) -> Result<CallbackId, DispatchError> {
        if let Some(id) = self.free.pop() {
            return Ok(id);
        }

        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        if raw < self.limit {
            return Ok(CallbackId(raw as u32));
        }

        // A release may have landed between the pop and the increment.
        self.free
            .pop()
            .ok_or(DispatchError::CallbackIdsExhausted { limit: self.limit })
    }

    /// Return an id for reuse. The id must no longer be pending.
    pub fn release(&self, id: CallbackId) {
        self.free.push(id);
    }

    /// Distinct ids drawn from the counter so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed).min(self.limit)
    }

    /// Approximate number of ids waiting for reuse.
    pub fn recycled_len(&self) -> usize {
        self.free.len()
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for CallbackIdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackIdPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackIdPool")
            .field("issued", &self.issued())
            .field("recycled", &self.recycled_len())
            .field("limit", &self.limit)
            .finish()
    }
}
