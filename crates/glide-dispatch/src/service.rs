//! Callback dispatcher: the correlation engine.
//!
//! Flow:
//! 1. Caller calls `submit()` to get a callback id and a [`ResponseHandle`]
//! 2. Caller stamps the id into its request and hands it to the transport
//! 3. Reader context receives the response and calls `on_response()`
//! 4. Caller awaits the handle
//!
//! `shutdown()` cancels everything still outstanding.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glide_telemetry::metrics::{
    CALLBACKS_CANCELLED, CALLBACKS_COMPLETED, CALLBACKS_PENDING, CALLBACKS_REGISTERED,
    UNMATCHED_RESPONSES,
};
use tracing::{debug, error, info, warn};

use crate::domain::{
    CallbackId, CallbackIdPool, ConfigError, ConnectionPhase, DispatchConfig, DispatchError,
    DispatchResult, DispatchStats, DispatchStatsSnapshot, PendingCallback, PendingCallbacks,
    RequestKind, ResponseHandle,
};
use crate::ports::UnmatchedResponseHook;

/// Assigns callback ids to outgoing requests and routes responses back.
///
/// Share it behind an `Arc`; every method takes `&self` and none of them
/// block. Responses may be delivered in any order.
pub struct CallbackDispatcher<R> {
    ids: CallbackIdPool,
    pending: PendingCallbacks<R>,
    phase: ConnectionPhase,
    closed: AtomicBool,
    stats: DispatchStats,
    unmatched_hook: Option<Arc<dyn UnmatchedResponseHook>>,
}

impl<R> CallbackDispatcher<R> {
    pub fn new() -> Self {
        Self::with_id_pool(CallbackIdPool::new())
    }

    /// Build a dispatcher from validated settings.
    pub fn with_config(config: &DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_id_pool(CallbackIdPool::with_limit(
            config.callback_id_limit,
        )))
    }

    fn with_id_pool(ids: CallbackIdPool) -> Self {
        Self {
            ids,
            pending: PendingCallbacks::new(),
            phase: ConnectionPhase::new(),
            closed: AtomicBool::new(false),
            stats: DispatchStats::default(),
            unmatched_hook: None,
        }
    }

    /// Install an observer for responses that match no pending callback.
    pub fn with_unmatched_hook(mut self, hook: Arc<dyn UnmatchedResponseHook>) -> Self {
        self.unmatched_hook = Some(hook);
        self
    }

    /// Register a command and get the id to stamp plus the handle to await.
    pub fn submit(&self) -> DispatchResult<(CallbackId, ResponseHandle<R>)> {
        self.register(RequestKind::Command)
    }

    /// Register the handshake request. By convention this is the first
    /// registration on a connection.
    pub fn register_connection(&self) -> DispatchResult<(CallbackId, ResponseHandle<R>)> {
        self.register(RequestKind::Connection)
    }

    fn register(&self, kind: RequestKind) -> DispatchResult<(CallbackId, ResponseHandle<R>)> {
        if self.is_closed() {
            return Err(DispatchError::ConnectionClosed);
        }

        let callback_id = self.ids.allocate()?;
        let (callback, handle) = PendingCallback::new(callback_id);

        if let Err(e) = self.pending.register(callback_id, callback) {
            // The id belongs to the entry already registered; do not recycle it.
            error!(callback_id = %callback_id, "Pool issued a callback id that is still pending");
            return Err(e);
        }
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        CALLBACKS_REGISTERED.inc();
        CALLBACKS_PENDING.inc();

        // Shutdown may have drained the registry between the first check and
        // the insert. Whoever removes the entry resolves and recycles it.
        if self.is_closed() {
            if let Some(callback) = self.pending.take(callback_id) {
                self.cancel(callback_id, callback);
            }
            return Err(DispatchError::ConnectionClosed);
        }

        debug!(
            callback_id = %callback_id,
            kind = ?kind,
            pending = self.pending.len(),
            "Registered callback"
        );

        Ok((callback_id, handle))
    }

    /// Resolve the request tagged `callback_id` with `payload`.
    ///
    /// Returns false, without touching any state, when nothing is pending
    /// under that id.
    pub fn on_response(&self, callback_id: CallbackId, payload: R) -> bool {
        self.resolve(callback_id, Ok(payload))
    }

    /// Resolve the request tagged `callback_id` with an error from the core.
    pub fn on_error(&self, callback_id: CallbackId, error: DispatchError) -> bool {
        self.resolve(callback_id, Err(error))
    }

    fn resolve(&self, callback_id: CallbackId, outcome: DispatchResult<R>) -> bool {
        let Some(callback) = self.pending.take(callback_id) else {
            self.report_unmatched(callback_id);
            return false;
        };

        self.ids.release(callback_id);
        self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
        CALLBACKS_COMPLETED.inc();
        CALLBACKS_PENDING.dec();

        let age = callback.age();
        if callback.resolve(outcome) {
            debug!(
                callback_id = %callback_id,
                response_time_us = age.as_micros() as u64,
                "Completed callback"
            );
        } else {
            self.stats
                .total_dropped_handles
                .fetch_add(1, Ordering::Relaxed);
            debug!(callback_id = %callback_id, "Caller dropped its response handle");
        }
        true
    }

    fn report_unmatched(&self, callback_id: CallbackId) {
        self.stats.total_unmatched.fetch_add(1, Ordering::Relaxed);
        UNMATCHED_RESPONSES.inc();
        warn!(
            callback_id = %callback_id,
            closed = self.is_closed(),
            "Response for unknown callback id"
        );
        if let Some(hook) = &self.unmatched_hook {
            hook.on_unmatched(callback_id);
        }
    }

    /// Remove a request whose frame never reached the transport.
    ///
    /// Only for send failures; a request that was written must be left for
    /// its response or for shutdown. Returns false if it was already resolved.
    pub fn withdraw(&self, callback_id: CallbackId) -> bool {
        match self.pending.take(callback_id) {
            Some(callback) => {
                self.cancel(callback_id, callback);
                true
            }
            None => false,
        }
    }

    fn cancel(&self, callback_id: CallbackId, callback: PendingCallback<R>) {
        self.ids.release(callback_id);
        self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        CALLBACKS_CANCELLED.inc();
        CALLBACKS_PENDING.dec();
        if !callback.resolve(Err(DispatchError::ConnectionClosed)) {
            self.stats
                .total_dropped_handles
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Close the dispatcher and cancel every outstanding request.
    ///
    /// Idempotent. Returns the number of requests cancelled by this call.
    pub fn shutdown(&self) -> usize {
        self.shutdown_with_reason("shutdown requested")
    }

    /// [`shutdown`](Self::shutdown) with the reason recorded in the log.
    pub fn shutdown_with_reason(&self, reason: &str) -> usize {
        let first = !self.closed.swap(true, Ordering::SeqCst);

        let drained = self.pending.drain();
        let cancelled = drained.len();
        for (callback_id, callback) in drained {
            self.cancel(callback_id, callback);
        }

        if first {
            info!(reason = reason, cancelled = cancelled, "Callback dispatcher shut down");
        } else if cancelled > 0 {
            debug!(cancelled = cancelled, "Late shutdown pass cancelled callbacks");
        }
        cancelled
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Record the successful handshake. Idempotent.
    pub fn mark_connected(&self) -> bool {
        let transitioned = self.phase.mark_connected();
        if transitioned {
            info!("Connection established");
        }
        transitioned
    }

    pub fn is_connected(&self) -> bool {
        self.phase.is_connected()
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, callback_id: CallbackId) -> bool {
        self.pending.contains(callback_id)
    }

    /// Distinct callback ids drawn from the counter so far.
    pub fn issued_ids(&self) -> u64 {
        self.ids.issued()
    }

    /// Callback ids waiting in the recycle set.
    pub fn recycled_ids(&self) -> usize {
        self.ids.recycled_len()
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }
}

impl<R> Default for CallbackDispatcher<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for CallbackDispatcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDispatcher")
            .field("ids", &self.ids)
            .field("pending", &self.pending.len())
            .field("connected", &self.is_connected())
            .field("closed", &self.is_closed())
            .finish()
    }
}
