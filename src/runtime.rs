//! The small capability set the scheduler loop is abstracted over, so the
//! core is testable against a mock runtime instead of real OS threads.
//!
//! Groups the `spec.md` §6 "consumed from the runtime" operations that are
//! genuinely swappable: `has_to_stop`, `check_events`, `wtime`, and
//! `self_schedule`. `pool_pop` lives on [`crate::pool::Pool`] instead, since
//! every pool implementation in this crate is the same concrete MPMC queue;
//! `xstream_self_rank` and `sched_config_read` are plain constructor
//! arguments rather than runtime queries once there's no opaque
//! `ABT_xstream`/`ABT_sched_config` handle to ask.

use crate::error::RuntimeError;
use crate::task::Task;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// The capabilities a scheduler loop needs from whatever is hosting it.
pub trait Runtime: Send + Sync {
    /// Run `task` to completion on the calling execution stream and return
    /// the elapsed wall-clock seconds.
    ///
    /// The default implementation just calls [`Task::run`] timed by
    /// [`Runtime::wtime`] — tasks in this crate run to completion rather than
    /// yielding mid-flight (see `spec.md` §1 Non-goals: preemption is out of
    /// scope), so there's no `return_pool` to requeue into.
    fn self_schedule(&self, mut task: Task) -> f64 {
        let start = self.wtime();
        task.run();
        self.wtime() - start
    }

    /// Cooperative termination flag, checked at each housekeeping boundary.
    fn has_to_stop(&self) -> bool;

    /// Runtime hook for delivering external signals/migrations. An `Err`
    /// here is fatal for the scheduler loop — there's no recovery path, per
    /// `spec.md` §7.
    fn check_events(&self, rank: usize) -> Result<(), RuntimeError>;

    /// Monotonic wall-clock seconds.
    fn wtime(&self) -> f64;
}

/// The bundled production [`Runtime`]: a shared stop flag and a monotonic
/// clock anchored at construction. `check_events` is a no-op by default.
pub struct ThreadRuntime {
    stop: Arc<AtomicBool>,
    epoch: Instant,
}

impl ThreadRuntime {
    /// Build a runtime with a fresh stop flag.
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            epoch: Instant::now(),
        }
    }

    /// A clonable handle to this runtime's stop flag, so an external caller
    /// (teardown) can request termination without holding the `Runtime`
    /// itself.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Request termination. Every scheduler sharing this runtime observes
    /// this at its next housekeeping boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl Default for ThreadRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for ThreadRuntime {
    fn has_to_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn check_events(&self, _rank: usize) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn wtime(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// A mock runtime used by scheduler-loop tests to force a fatal
/// `check_events` error deterministically.
#[cfg(test)]
pub(crate) struct FailingEventsRuntime {
    stop: AtomicBool,
}

#[cfg(test)]
impl FailingEventsRuntime {
    pub(crate) fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
impl Runtime for FailingEventsRuntime {
    fn has_to_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn check_events(&self, rank: usize) -> Result<(), RuntimeError> {
        Err(RuntimeError::EventCheckFailed {
            rank,
            reason: "simulated failure".to_string(),
        })
    }

    fn wtime(&self) -> f64 {
        0.0
    }
}
