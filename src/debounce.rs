//! Debounced delivery of rapidly changing values.
//!
//! A `Debouncer` delivers one value per settling episode: every `observe`
//! call cancels the pending delivery and starts a new timer, and only the
//! value from the last call reaches the callback once the timer elapses.
//! The callback is looked up when the timer fires, so re-registering a
//! callback between `observe` and delivery takes effect for that delivery.
//!
//! Nothing is ever delivered for a value that was not explicitly observed,
//! so constructing a debouncer (or the controller that owns one) never
//! fires the callback by itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debouncer<T> {
    /// The most recently registered callback
    callback: Arc<Mutex<Option<Callback<T>>>>,
    /// Incremented on every observe/cancel; a timer only delivers if its
    /// episode is still the current one when it fires
    episode: Arc<AtomicU64>,
    /// Timer task for the current episode
    pending: Option<JoinHandle<()>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self {
            callback: Arc::new(Mutex::new(None)),
            episode: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debouncer with its callback already registered
    pub fn with_callback(callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        let debouncer = Self::new();
        debouncer.register(callback);
        debouncer
    }

    /// Replace the callback invoked when an episode settles
    pub fn register(&self, callback: impl Fn(T) + Send + Sync + 'static) {
        *self.callback.lock() = Some(Arc::new(callback));
    }

    /// Schedule delivery of `value` after `delay` of quiet.
    ///
    /// Supersedes any pending delivery. A zero delay still delivers from a
    /// spawned task, never synchronously from inside this call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn observe(&mut self, value: T, delay: Duration) {
        self.abort_pending();
        let episode = self.episode.fetch_add(1, Ordering::SeqCst) + 1;

        let callback = Arc::clone(&self.callback);
        let current = Arc::clone(&self.episode);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if current.load(Ordering::SeqCst) != episode {
                return;
            }
            let callback = callback.lock().clone();
            if let Some(callback) = callback {
                tracing::trace!(episode, "debounce episode settled");
                callback(value);
            }
        }));
    }

    /// Drop the pending delivery, if any
    pub fn cancel(&mut self) {
        self.episode.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    /// Whether a delivery is scheduled and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.episode.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
