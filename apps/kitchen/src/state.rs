//! # Queue State
//!
//! Shared ownership wrapper around the kitchen's [`OrderQueue`].
//!
//! ## Thread Safety
//! The queue is wrapped in `Arc<Mutex<T>>` because the bridge's routing
//! task and the command loop both touch it, and only one of them may
//! mutate it at a time. Operations are quick synchronous mutations, so
//! a plain Mutex is enough.

use std::sync::{Arc, Mutex};

use comanda_core::OrderQueue;

/// Shared handle to the kitchen's order queue.
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    queue: Arc<Mutex<OrderQueue>>,
}

impl QueueState {
    /// Creates an empty queue state.
    pub fn new() -> Self {
        QueueState {
            queue: Arc::new(Mutex::new(OrderQueue::new())),
        }
    }

    /// Executes a function with read access to the queue.
    pub fn with_queue<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&OrderQueue) -> R,
    {
        let queue = self.queue.lock().expect("queue mutex poisoned");
        f(&queue)
    }

    /// Executes a function with write access to the queue.
    pub fn with_queue_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut OrderQueue) -> R,
    {
        let mut queue = self.queue.lock().expect("queue mutex poisoned");
        f(&mut queue)
    }
}
