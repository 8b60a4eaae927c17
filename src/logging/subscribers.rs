//! Line subscribers
//!
//! Callbacks and channels notified after each emitted line. Delivery is
//! fire-and-forget: a panicking callback is contained and logged, and
//! channels whose receiver went away are dropped on the next send.

use super::LogEvent;
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use tracing::warn;

type Callback = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(SubscriptionId, Callback)>>,
    channels: Mutex<Vec<mpsc::Sender<LogEvent>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback, returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Subscribe through a channel; dropping the receiver ends the subscription
    pub fn channel(&self) -> mpsc::Receiver<LogEvent> {
        let (tx, rx) = mpsc::channel();
        self.channels.lock().push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().len() + self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, event: &LogEvent) {
        // Snapshot so callbacks may (un)subscribe without deadlocking
        let callbacks: Vec<(SubscriptionId, Callback)> = self.callbacks.read().clone();
        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!("Log subscriber {:?} panicked, continuing", id);
            }
        }

        self.channels
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
