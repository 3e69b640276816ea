//! Hand-off of state transitions from background readers to the consumer tick.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tracing::trace;

use crate::state::LinkState;

/// A state transition queued by a background task and run on the consumer.
pub type PendingAction<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// FIFO queue of actions. Any thread may enqueue; one consumer drains.
pub struct MainLoopDispatcher<T> {
    queue: Mutex<VecDeque<PendingAction<T>>>,
}

impl<T> Default for MainLoopDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MainLoopDispatcher<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    // A panicking action never runs under the lock, so the queue is always consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingAction<T>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue<F>(&self, action: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.lock().push_back(Box::new(action));
    }

    /// Run every queued action against `target`, in enqueue order.
    ///
    /// The queue is swapped out before anything runs, so actions enqueued by
    /// the actions themselves wait for the next drain. Returns how many ran.
    pub fn drain(&self, target: &mut T) -> usize {
        let batch = std::mem::take(&mut *self.lock());
        let count = batch.len();
        for action in batch {
            action(target);
        }
        if count > 0 {
            trace!(count, "Drained pending actions");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> std::fmt::Debug for MainLoopDispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoopDispatcher")
            .field("pending", &self.len())
            .finish()
    }
}

/// Dispatcher type used between readers and the connection manager.
pub type LinkDispatcher = MainLoopDispatcher<LinkState>;

static SHARED_DISPATCHER: Lazy<Arc<LinkDispatcher>> =
    Lazy::new(|| Arc::new(MainLoopDispatcher::new()));

impl MainLoopDispatcher<LinkState> {
    /// Process-wide instance, created on first access.
    ///
    /// Only one manager should drain it; connection ids are per manager.
    pub fn shared() -> Arc<LinkDispatcher> {
        SHARED_DISPATCHER.clone()
    }
}
