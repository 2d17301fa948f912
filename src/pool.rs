//! The per-ES ready queue.
//!
//! `spec.md` treats the pool as an opaque, runtime-supplied FIFO with
//! multi-producer/multi-consumer access; this crate needs a concrete
//! implementation to be runnable and testable. [`Pool`] wraps a
//! [`crossbeam_deque::Injector`], which already has exactly the contract
//! required — FIFO order, safe concurrent push from any thread, safe
//! concurrent pop ("steal") from any thread — without needing the owning
//! thread's half of crossbeam's `Worker`/`Stealer` split, since every pool in
//! this scheduler is popped by both its own ES and by thieves.

use crate::task::Task;
use crossbeam_deque::{Injector, Steal};

/// An MPMC FIFO queue of ready tasks, owned by exactly one execution stream
/// but poppable by any.
pub struct Pool {
    queue: Injector<Task>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            queue: Injector::new(),
        }
    }

    /// Enqueue a task at the tail.
    pub fn push(&self, task: Task) {
        self.queue.push(task);
    }

    /// Pop a task from the head, or `None` if empty.
    ///
    /// Non-blocking: an `Injector` steal can report `Retry` under
    /// contention; this loops on `Retry` so callers only ever observe
    /// `Some`/`None`, matching the `pool_pop` contract in `spec.md` §6.
    pub fn pop(&self) -> Option<Task> {
        loop {
            match self.queue.steal() {
                Steal::Success(task) => return Some(task),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    /// `true` if the pool currently has no ready tasks.
    ///
    /// Best-effort — another thread may push or pop concurrently.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}
