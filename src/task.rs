//! The schedulable unit of work.

use std::fmt;

/// A schedulable unit of work with an optional producer-supplied cost
/// estimate.
///
/// The scheduler never inspects the closure body; it only ever calls
/// [`Task::run`] exactly once. `work` is an `Option` so `.take()` enforces
/// that "exactly once" at the type level, same as the teacher's `Task`.
pub struct Task {
    work: Option<Box<dyn FnOnce() + Send + 'static>>,
    cost: Option<f64>,
}

impl Task {
    /// Create a task with no cost estimate.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            work: Some(Box::new(f)),
            cost: None,
        }
    }

    /// Create a task carrying a non-negative cost estimate.
    ///
    /// A negative estimate is clamped to `0.0` — the registry's invariants
    /// require every pending estimate to be non-negative.
    pub fn with_cost<F>(cost: f64, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            work: Some(Box::new(f)),
            cost: Some(cost.max(0.0)),
        }
    }

    /// The task's cost estimate, if the producer supplied one.
    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    /// Run the task's closure, consuming it.
    ///
    /// Returns `true` if work was present and ran, `false` if the task had
    /// already been consumed (defensive — in normal operation every `Task`
    /// is run exactly once).
    pub fn run(&mut self) -> bool {
        if let Some(f) = self.work.take() {
            f();
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("has_work", &self.work.is_some())
            .field("cost", &self.cost)
            .finish()
    }
}
