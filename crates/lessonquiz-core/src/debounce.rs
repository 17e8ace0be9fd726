//! Keyed, cancel-on-reschedule timers.
//!
//! Scheduling a message under a key replaces any message still pending for
//! that key, so only the last of a burst of schedules is ever delivered.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Debouncer<K, T> {
    tx: mpsc::UnboundedSender<T>,
    pending: HashMap<K, JoinHandle<()>>,
}

impl<K, T> Debouncer<K, T>
where
    K: Eq + Hash,
    T: Send + 'static,
{
    /// Create a debouncer and the receiver its messages arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            tx,
            pending: HashMap::new(),
        };
        (debouncer, rx)
    }

    /// Deliver `message` after `delay` unless rescheduled or cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, key: K, delay: Duration, message: T) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver may be gone; nothing left to notify then.
            let _ = tx.send(message);
        });
        if let Some(previous) = self.pending.insert(key, handle) {
            previous.abort();
        }
    }

    pub fn cancel(&mut self, key: &K) {
        if let Some(handle) = self.pending.remove(key) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    /// Keys with a timer that has not fired yet.
    pub fn pending(&self) -> usize {
        self.pending.values().filter(|h| !h.is_finished()).count()
    }
}

impl<K, T> Drop for Debouncer<K, T> {
    fn drop(&mut self) {
        for handle in self.pending.values() {
            handle.abort();
        }
    }
}
