//! The per-ES scheduling loop, the factory that builds a set of schedulers
//! bound to a shared [`LoadRegistry`], and [`WorkStealingRuntime`], the
//! managed orchestration layer that actually runs them on OS threads.
//!
//! # Work-stealing algorithm
//!
//! Each execution stream runs [`WorkerScheduler::run`] with the following
//! priority:
//! 1. Pop from its own pool (cheapest — no contention, no registry read).
//! 2. If empty, ask the [`crate::victim`] selector for the peer with the
//!    most estimated outstanding work and steal one task from it.
//! 3. Every `event_freq` iterations, check the stop flag and the runtime's
//!    event hook.
//!
//! Task completion is attributed to the *executor's* rank, never the task's
//! origin — the historical table measures worker utilization, not where
//! work was submitted.

use crate::config::SchedulerConfig;
use crate::error::StopReason;
use crate::pool::Pool;
use crate::registry::{GlobalStats, LoadRegistry};
use crate::runtime::{Runtime, ThreadRuntime};
use crate::task::Task;
use crate::victim::{select_victim, VictimStrategy};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// WorkerScheduler
// ---------------------------------------------------------------------------

/// Per-ES scheduler state: the pool rotation, the shared registry, the
/// chosen victim-selection strategy, and `event_freq`.
///
/// Constructed exclusively by [`create_ws_schedulers`]; torn down by simply
/// dropping it (there is no heap-allocated local state beyond the `Vec` and
/// `Arc`s, which Rust already frees deterministically — unlike the source's
/// `ws_sched_data_t`, there is no separate `free` step to get wrong).
pub struct WorkerScheduler<R: Runtime> {
    rank: usize,
    n: usize,
    /// Rotated so `rotated_pools[0]` is this ES's own pool and
    /// `rotated_pools[k]` is `pools_global[(rank + k) % n]` — preserves the
    /// "prefer local" convention even though the actual choice of victim is
    /// load-driven, not positional.
    rotated_pools: Vec<Arc<Pool>>,
    registry: Arc<LoadRegistry>,
    strategy: VictimStrategy,
    config: SchedulerConfig,
    runtime: Arc<R>,
}

impl<R: Runtime> WorkerScheduler<R> {
    /// This scheduler's execution-stream rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    fn pool_for_global_rank(&self, global_rank: usize) -> &Arc<Pool> {
        let local_idx = (global_rank + self.n - self.rank) % self.n;
        &self.rotated_pools[local_idx]
    }

    /// Run the scheduler loop until a stop is requested or the runtime
    /// reports a fatal error from `check_events`.
    pub fn run(&self) -> StopReason {
        let mut work_count: u32 = 0;

        loop {
            let mut did_work = false;

            if let Some(task) = self.rotated_pools[0].pop() {
                // Local hit: consume the matching head-of-FIFO estimate and
                // run it on this ES.
                self.registry.pop_estimate(self.rank);
                let elapsed = self.runtime.self_schedule(task);
                self.registry.record_completion(self.rank, elapsed);
                did_work = true;
            } else if let Some(victim) = select_victim(&self.registry, self.rank, self.n, self.strategy) {
                if let Some(task) = self.pool_for_global_rank(victim).pop() {
                    // Best-effort: the popped task and the FIFO head may have
                    // drifted if a race let someone else touch the victim's
                    // queue between selection and pop. Tolerated per
                    // `spec.md` §5 — the estimate is a heuristic, not a
                    // correctness mechanism.
                    self.registry.pop_estimate(victim);
                    tracing::debug!(thief = self.rank, victim, "stole a task");
                    let elapsed = self.runtime.self_schedule(task);
                    self.registry.record_completion(self.rank, elapsed);
                    did_work = true;
                }
                // Victim's queue raced to empty — try again next iteration.
            }
            // Local empty and no victim: nothing to do this iteration.

            work_count += 1;
            if work_count >= self.config.event_freq() {
                work_count = 0;
                if self.runtime.has_to_stop() {
                    return StopReason::Requested;
                }
                if let Err(err) = self.runtime.check_events(self.rank) {
                    return StopReason::RuntimeError(err.to_string());
                }
            }

            // Nothing to do this iteration — every peer's estimated load was
            // zero or races beat us to every pool. Park briefly rather than
            // busy-spinning `select_victim`'s per-slot registry locks across
            // every peer on every idle iteration (one real OS thread per ES
            // here, unlike the ULT-multiplexed ESs in the source).
            if !did_work {
                thread::park_timeout(Duration::from_millis(1));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a registry and a scheduler per pool, each wired with its own
/// rotated pool view so its own pool is first and peers follow in rotated
/// order.
///
/// `pools.len()` determines `N`. The caller is responsible for binding each
/// returned scheduler to an execution stream and running it — this crate's
/// [`WorkStealingRuntime`] does that with OS threads, but
/// `create_ws_schedulers` itself has no opinion about how
/// `WorkerScheduler::run` gets called, which is what keeps it unit-testable
/// against a mock [`Runtime`] with zero threads.
pub fn create_ws_schedulers<R: Runtime>(
    pools: &[Arc<Pool>],
    runtime: Arc<R>,
    config: SchedulerConfig,
    strategy: VictimStrategy,
) -> (Arc<LoadRegistry>, Vec<WorkerScheduler<R>>) {
    let n = pools.len();
    let registry = Arc::new(LoadRegistry::new(n));

    let scheds = (0..n)
        .map(|i| {
            let rotated_pools = (0..n).map(|k| Arc::clone(&pools[(i + k) % n])).collect();
            WorkerScheduler {
                rank: i,
                n,
                rotated_pools,
                registry: Arc::clone(&registry),
                strategy,
                config,
                runtime: Arc::clone(&runtime),
            }
        })
        .collect();

    (registry, scheds)
}

// ---------------------------------------------------------------------------
// WorkStealingRuntime — managed orchestration over OS threads
// ---------------------------------------------------------------------------

/// A fully-managed work-stealing runtime: `N` pools, one OS thread per
/// execution stream, and the shared [`LoadRegistry`] and [`ThreadRuntime`]
/// wiring them together.
///
/// This is additive ambient wiring on top of [`create_ws_schedulers`] — the
/// spec leaves ES creation and binding to "the runtime" and treats ES 0 as
/// the factory's caller. A library consumer still needs *something* runnable
/// end to end, so this type plays that role, analogous to the teacher's own
/// `Scheduler::new`.
pub struct WorkStealingRuntime {
    pools: Vec<Arc<Pool>>,
    registry: Arc<LoadRegistry>,
    runtime: Arc<ThreadRuntime>,
    handles: Vec<thread::JoinHandle<StopReason>>,
    es_count: usize,
}

impl WorkStealingRuntime {
    /// Create and start a runtime with `num_es` execution streams.
    ///
    /// Passing `0` defaults to the number of available CPUs, same as the
    /// teacher's `Scheduler::new(0)`.
    pub fn new(num_es: usize, config: SchedulerConfig) -> Self {
        Self::with_strategy(num_es, config, VictimStrategy::Live)
    }

    /// Like [`WorkStealingRuntime::new`], but with an explicit
    /// [`VictimStrategy`].
    pub fn with_strategy(num_es: usize, config: SchedulerConfig, strategy: VictimStrategy) -> Self {
        let es_count = if num_es == 0 { num_cpus::get().max(1) } else { num_es };

        let pools: Vec<Arc<Pool>> = (0..es_count).map(|_| Arc::new(Pool::new())).collect();
        let runtime = Arc::new(ThreadRuntime::new());
        let (registry, scheds) = create_ws_schedulers(&pools, Arc::clone(&runtime), config, strategy);

        tracing::info!(es_count, "creating cost-aware work-stealing scheduler set");

        let mut handles = Vec::with_capacity(es_count);
        for sched in scheds {
            let rank = sched.rank();
            match thread::Builder::new()
                .name(format!("ws-scheduler-{rank}"))
                .spawn(move || sched.run())
            {
                Ok(jh) => handles.push(jh),
                Err(err) => {
                    tracing::warn!(rank, %err, "failed to spawn execution stream thread");
                }
            }
        }

        Self {
            pools,
            registry,
            runtime,
            handles,
            es_count,
        }
    }

    /// Number of execution streams this runtime was built with.
    pub fn es_count(&self) -> usize {
        self.es_count
    }

    /// Producers must call this immediately before (or atomically with)
    /// enqueueing a task into pool `rank` — pushing the task first and the
    /// estimate second would let a scheduler pop the task before its
    /// estimate exists.
    ///
    /// If `task` carries a cost estimate it is pushed into the registry
    /// first; the task is then pushed into its pool.
    pub fn submit(&self, rank: usize, task: Task) {
        if let Some(cost) = task.cost() {
            self.registry.push_estimate(rank, cost);
        }
        if let Some(pool) = self.pools.get(rank) {
            pool.push(task);
        }
    }

    /// The shared load registry, for producers/tools that want to read
    /// estimates or historical stats directly.
    pub fn registry(&self) -> &LoadRegistry {
        &self.registry
    }

    /// A snapshot of historical + live tables.
    pub fn global_stats(&self) -> GlobalStats {
        self.registry.global_stats()
    }

    /// Block until at least `expected` tasks have completed across every
    /// execution stream, or `timeout` elapses. Returns the actual completed
    /// count at the time the wait ended.
    pub fn wait_for_completion(&self, expected: u64, timeout: Duration) -> u64 {
        let deadline = Instant::now() + timeout;
        loop {
            let total: u64 = (0..self.es_count).map(|r| self.registry.historical(r).task_count).sum();
            if total >= expected || Instant::now() >= deadline {
                return total;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop every execution stream and join its thread. Idempotent — the
    /// second and later calls find no handles left to join and return
    /// immediately.
    pub fn shutdown(&mut self) {
        self.runtime.request_stop();
        for jh in self.handles.drain(..) {
            let _ = jh.join();
        }
        tracing::info!("scheduler set torn down");
    }
}

impl Drop for WorkStealingRuntime {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for WorkStealingRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkStealingRuntime")
            .field("es_count", &self.es_count)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
