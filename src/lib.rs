//! A cost-aware work-stealing scheduler for a user-level threading runtime.
//!
//! The runtime multiplexes many lightweight tasks onto a fixed set of
//! OS-backed execution streams (ES). Each ES owns a local ready queue
//! ([`pool::Pool`]) and runs a scheduling loop
//! ([`scheduler::WorkerScheduler::run`]) that pops locally first and steals
//! from a peer, chosen by an estimated-load heuristic
//! ([`victim::select_victim`]), when its own queue is empty.
//!
//! ```no_run
//! use ws_scheduler::{SchedulerConfig, Task, WorkStealingRuntime};
//! use std::time::Duration;
//!
//! let rt = WorkStealingRuntime::new(4, SchedulerConfig::default());
//! for i in 0..100 {
//!     rt.submit(i % 4, Task::with_cost(1.0, move || {
//!         // do work
//!     }));
//! }
//! rt.wait_for_completion(100, Duration::from_secs(5));
//! println!("{}", rt.global_stats());
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod task;
pub mod victim;

pub use config::SchedulerConfig;
pub use error::{RuntimeError, StopReason};
pub use pool::Pool;
pub use registry::{GlobalStats, HistoricalEntry, LoadRegistry};
pub use runtime::{Runtime, ThreadRuntime};
pub use scheduler::{create_ws_schedulers, WorkStealingRuntime, WorkerScheduler};
pub use task::Task;
pub use victim::{select_victim, VictimStrategy};
