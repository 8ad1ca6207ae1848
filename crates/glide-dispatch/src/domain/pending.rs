//! Pending callback registry.
//!
//! Maps callback ids to the senders of waiting callers. Whoever removes an
//! entry owns its resolution, so a response and a shutdown racing for the
//! same id can never both resolve it.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::domain::error::DispatchError;
use crate::domain::ids::CallbackId;

type Outcome<R> = Result<R, DispatchError>;

/// Caller side of a pending request. Resolves exactly once.
///
/// Resolves with [`DispatchError::ConnectionClosed`] when the dispatcher is
/// shut down before a response arrives.
#[derive(Debug)]
pub struct ResponseHandle<R> {
    callback_id: CallbackId,
    receiver: oneshot::Receiver<Outcome<R>>,
}

impl<R> ResponseHandle<R> {
    pub fn callback_id(&self) -> CallbackId {
        self.callback_id
    }

    /// Non-blocking check. Returns `None` while the request is outstanding.
    ///
    /// Once this returns `Some`, the handle must not be awaited.
    pub fn try_take(&mut self) -> Option<Outcome<R>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(DispatchError::ConnectionClosed)),
        }
    }
}

impl<R> Future for ResponseHandle<R> {
    type Output = Outcome<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::ConnectionClosed)))
    }
}

/// Registry side of a pending request.
#[derive(Debug)]
pub struct PendingCallback<R> {
    sender: oneshot::Sender<Outcome<R>>,
    registered_at: Instant,
}

impl<R> PendingCallback<R> {
    /// Create the registry entry and the handle given to the caller.
    pub fn new(callback_id: CallbackId) -> (Self, ResponseHandle<R>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender,
                registered_at: Instant::now(),
            },
            ResponseHandle {
                callback_id,
                receiver,
            },
        )
    }

    /// Deliver the outcome. Returns false if the caller dropped its handle.
    pub fn resolve(self, outcome: Outcome<R>) -> bool {
        self.sender.send(outcome).is_ok()
    }

    pub fn age(&self) -> Duration {
        self.registered_at.elapsed()
    }
}

/// Concurrent map of outstanding callbacks.
pub struct PendingCallbacks<R> {
    pending: DashMap<CallbackId, PendingCallback<R>>,
}

impl<R> PendingCallbacks<R> {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Insert a new entry. An existing entry for `id` is left untouched.
    pub fn register(&self, id: CallbackId, callback: PendingCallback<R>) -> Result<(), DispatchError> {
        match self.pending.entry(id) {
            Entry::Occupied(_) => Err(DispatchError::DuplicateCallbackId(id)),
            Entry::Vacant(slot) => {
                slot.insert(callback);
                Ok(())
            }
        }
    }

    /// Remove and return the entry for `id`, if any.
    pub fn take(&self, id: CallbackId) -> Option<PendingCallback<R>> {
        self.pending.remove(&id).map(|(_, callback)| callback)
    }

    /// Remove the entry for `id` and resolve it with `payload`.
    ///
    /// Returns whether an entry was found.
    pub fn complete(&self, id: CallbackId, payload: R) -> bool {
        match self.take(id) {
            Some(callback) => {
                callback.resolve(Ok(payload));
                true
            }
            None => false,
        }
    }

    /// Remove every entry. Entries inserted while draining may be missed.
    pub fn drain(&self) -> Vec<(CallbackId, PendingCallback<R>)> {
        let ids: Vec<CallbackId> = self.pending.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: CallbackId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Age of the longest-waiting entry.
    pub fn oldest_age(&self) -> Option<Duration> {
        self.pending.iter().map(|entry| entry.value().age()).max()
    }
}

impl<R> Default for PendingCallbacks<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters kept by the dispatcher.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Total callbacks registered
    pub total_registered: AtomicU64,
    /// Total callbacks resolved by a response
    pub total_completed: AtomicU64,
    /// Total callbacks cancelled by shutdown or withdrawn after a failed send
    pub total_cancelled: AtomicU64,
    /// Responses that matched no pending callback
    pub total_unmatched: AtomicU64,
    /// Resolutions that found the caller had dropped its handle
    pub total_dropped_handles: AtomicU64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            registered: self.total_registered.load(Ordering::Relaxed),
            completed: self.total_completed.load(Ordering::Relaxed),
            cancelled: self.total_cancelled.load(Ordering::Relaxed),
            unmatched: self.total_unmatched.load(Ordering::Relaxed),
            dropped_handles: self.total_dropped_handles.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub unmatched: u64,
    pub dropped_handles: u64,
}
