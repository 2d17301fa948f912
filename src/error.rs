//! Error types for the work-stealing scheduler.
//!
//! Per the error-handling policy: almost every failure mode in this crate
//! (bad rank, lost estimate, lost steal race, empty pool) is recovered
//! locally and never surfaces as a `Result`. [`RuntimeError`] exists for the
//! one case that does: a [`crate::runtime::Runtime::check_events`] call
//! failing, which the scheduler loop cannot recover from and must propagate
//! by terminating.

use std::fmt;

/// A fatal error raised by the runtime the scheduler is driving.
///
/// The only source of `RuntimeError` is
/// [`Runtime::check_events`](crate::runtime::Runtime::check_events). The
/// scheduler loop has no recovery path for this: on `Err`, it stops.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The runtime's event-check hook (signal delivery, migration, etc.)
    /// failed for the given execution stream rank.
    #[error("check_events failed on rank {rank}: {reason}")]
    EventCheckFailed {
        /// Rank of the execution stream whose housekeeping check failed.
        rank: usize,
        /// Human-readable reason, opaque to the scheduler.
        reason: String,
    },
}

/// Why a [`WorkerScheduler`](crate::scheduler::WorkerScheduler) loop
/// terminated.
///
/// This is not an error type in the `std::error::Error` sense — a clean stop
/// is the expected, common outcome. It's surfaced so callers (and tests) can
/// distinguish "stopped because asked to" from "stopped because the runtime
/// broke."
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// `has_to_stop` returned true at a housekeeping checkpoint.
    Requested,
    /// `check_events` returned an error; see the attached message.
    RuntimeError(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::RuntimeError(msg) => write!(f, "runtime error: {msg}"),
        }
    }
}
