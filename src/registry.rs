//! The Load Registry: shared, thread-safe tables of live per-pool estimated
//! cost and historical per-ES completion totals.
//!
//! Re-architected from the source's `g_pool_meta` (a hand-rolled circular
//! buffer with manual head/tail indices and manual doubling) and `g_loads`
//! (a raw array behind one mutex) into an explicit object constructed by the
//! [`crate::scheduler::create_ws_schedulers`] factory and shared via `Arc`.
//! A `VecDeque` already *is* an owned growable ring with head/tail indices,
//! so the manual buffer becomes exactly that — no hand-rolled growth logic
//! needed.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// Live per-pool state: the pending cost-estimate FIFO and its running sum.
struct PoolLoad {
    estimates: VecDeque<f64>,
    sum: f64,
}

impl PoolLoad {
    fn with_capacity(cap: usize) -> Self {
        Self {
            estimates: VecDeque::with_capacity(cap),
            sum: 0.0,
        }
    }
}

/// Historical completion statistics for one execution stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoricalEntry {
    /// Cumulative elapsed seconds across every task completed on this ES.
    pub total_elapsed: f64,
    /// Number of tasks completed on this ES.
    pub task_count: u64,
}

/// A point-in-time dump of the registry, suitable for printing or asserting
/// on in tests. Carries forward `ws_print_global_stats` from the original
/// source in typed form.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    /// Per-ES `(historical, live_estimated_load, live_pending_count)`.
    pub per_es: Vec<(HistoricalEntry, f64, usize)>,
}

impl fmt::Display for GlobalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== scheduler global stats ===")?;
        for (rank, (hist, load, count)) in self.per_es.iter().enumerate() {
            writeln!(
                f,
                "ES {rank}: elapsed={:.6} completed={} estimated_load={:.6} pending={}",
                hist.total_elapsed, hist.task_count, load, count
            )?;
        }
        Ok(())
    }
}

/// Initial capacity of each pool's live estimate ring, matching the source's
/// `pool_meta_init_one(&g_pool_meta[i], 1024)`.
pub const INITIAL_ESTIMATE_CAPACITY: usize = 1024;

/// Shared, thread-safe tables of live per-pool estimated cost and historical
/// per-ES completion totals.
///
/// Every operation is thread-safe and non-blocking on task execution — the
/// registry only ever holds its own mutexes, briefly, never a pool's.
pub struct LoadRegistry {
    live: Vec<Mutex<PoolLoad>>,
    historical: Mutex<Vec<HistoricalEntry>>,
}

impl LoadRegistry {
    /// Build a registry with `n` slots, live FIFOs pre-sized to
    /// [`INITIAL_ESTIMATE_CAPACITY`] and zeroed historical counters.
    pub fn new(n: usize) -> Self {
        let live = (0..n)
            .map(|_| Mutex::new(PoolLoad::with_capacity(INITIAL_ESTIMATE_CAPACITY)))
            .collect();
        let historical = Mutex::new(vec![HistoricalEntry::default(); n]);
        Self { live, historical }
    }

    /// Number of ES slots this registry was built for.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// `true` if this registry has no slots (degenerate `N = 0`).
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Append `est` to the tail of pool `rank`'s estimate FIFO.
    ///
    /// Out-of-range `rank` is a silent no-op. If growing the FIFO would
    /// require an allocation that fails, the failure is logged and the push
    /// is dropped — the estimate is lost (degrading the selector's
    /// accuracy), but the caller's task still runs normally through the
    /// pool itself.
    pub fn push_estimate(&self, rank: usize, est: f64) {
        let Some(slot) = self.live.get(rank) else {
            return;
        };
        let mut slot = slot.lock().unwrap();
        if slot.estimates.len() == slot.estimates.capacity() {
            if let Err(err) = slot.estimates.try_reserve(1) {
                tracing::error!(rank, %err, "failed to grow estimate buffer, dropping estimate");
                return;
            }
        }
        slot.estimates.push_back(est);
        slot.sum += est;
    }

    /// Remove and return the head of pool `rank`'s estimate FIFO.
    ///
    /// Returns `None` on an empty FIFO or an out-of-range `rank`. Clamps the
    /// running sum to `0.0` on underflow as a defensive invariant — it
    /// should never go negative, but a tolerated push/pop race (see
    /// `spec.md` §5) must never be allowed to leave the registry in an
    /// inconsistent state.
    pub fn pop_estimate(&self, rank: usize) -> Option<f64> {
        let slot = self.live.get(rank)?;
        let mut slot = slot.lock().unwrap();
        let est = slot.estimates.pop_front()?;
        slot.sum -= est;
        if slot.sum < 0.0 {
            slot.sum = 0.0;
        }
        Some(est)
    }

    /// The running sum of pending estimates for pool `rank`, or `0.0` if
    /// `rank` is out of range.
    pub fn estimated_load(&self, rank: usize) -> f64 {
        self.live
            .get(rank)
            .map(|slot| slot.lock().unwrap().sum)
            .unwrap_or(0.0)
    }

    /// Number of pending estimates for pool `rank`, or `0` if out of range.
    pub fn estimated_count(&self, rank: usize) -> usize {
        self.live
            .get(rank)
            .map(|slot| slot.lock().unwrap().estimates.len())
            .unwrap_or(0)
    }

    /// Record a completed task's elapsed time against ES `rank`.
    ///
    /// Out-of-range `rank` is a silent no-op, same as every other registry
    /// write.
    pub fn record_completion(&self, rank: usize, elapsed: f64) {
        let mut hist = self.historical.lock().unwrap();
        if let Some(entry) = hist.get_mut(rank) {
            entry.total_elapsed += elapsed;
            entry.task_count += 1;
        }
    }

    /// Historical `(total_elapsed, task_count)` for ES `rank`, or the zero
    /// entry if out of range.
    pub fn historical(&self, rank: usize) -> HistoricalEntry {
        self.historical
            .lock()
            .unwrap()
            .get(rank)
            .copied()
            .unwrap_or_default()
    }

    /// A full snapshot of live and historical state, for printing or
    /// assertions. Not linearizable across slots — see `spec.md` §4.A's
    /// concurrency contract.
    pub fn global_stats(&self) -> GlobalStats {
        let n = self.len();
        let per_es = (0..n)
            .map(|rank| (self.historical(rank), self.estimated_load(rank), self.estimated_count(rank)))
            .collect();
        GlobalStats { per_es }
    }
}

impl fmt::Debug for LoadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRegistry")
            .field("slots", &self.live.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_is_fifo() {
        let reg = LoadRegistry::new(2);
        reg.push_estimate(0, 1.0);
        reg.push_estimate(0, 2.0);
        reg.push_estimate(0, 3.0);

        assert_eq!(reg.estimated_load(0), 6.0);
        assert_eq!(reg.pop_estimate(0), Some(1.0));
        assert_eq!(reg.pop_estimate(0), Some(2.0));
        assert_eq!(reg.estimated_load(0), 3.0);
        assert_eq!(reg.pop_estimate(0), Some(3.0));
        assert_eq!(reg.pop_estimate(0), None);
        assert_eq!(reg.estimated_load(0), 0.0);
    }

    #[test]
    fn out_of_range_rank_is_silent_no_op() {
        let reg = LoadRegistry::new(2);
        reg.push_estimate(7, 5.0); // no-op, not a panic
        assert_eq!(reg.pop_estimate(7), None);
        assert_eq!(reg.estimated_load(7), 0.0);
        reg.record_completion(7, 1.0); // no-op
        assert_eq!(reg.historical(7), HistoricalEntry::default());
    }

    #[test]
    fn sum_and_count_never_go_negative() {
        let reg = LoadRegistry::new(1);
        // Pop from an empty FIFO repeatedly; sum must stay clamped at 0.
        for _ in 0..5 {
            assert_eq!(reg.pop_estimate(0), None);
        }
        assert_eq!(reg.estimated_load(0), 0.0);
        assert_eq!(reg.estimated_count(0), 0);
    }

    #[test]
    fn buffer_growth_beyond_initial_capacity_preserves_order_and_sum() {
        let reg = LoadRegistry::new(1);
        let n = INITIAL_ESTIMATE_CAPACITY + 500;
        let mut expected_sum = 0.0;
        for i in 0..n {
            let est = i as f64;
            reg.push_estimate(0, est);
            expected_sum += est;
        }
        assert_eq!(reg.estimated_load(0), expected_sum);
        assert_eq!(reg.estimated_count(0), n);

        for i in 0..n {
            assert_eq!(reg.pop_estimate(0), Some(i as f64));
        }
        assert_eq!(reg.pop_estimate(0), None);
        assert_eq!(reg.estimated_load(0), 0.0);
    }

    #[test]
    fn record_completion_is_monotonically_non_decreasing() {
        let reg = LoadRegistry::new(1);
        reg.record_completion(0, 1.5);
        let first = reg.historical(0);
        assert_eq!(first.task_count, 1);
        reg.record_completion(0, 2.5);
        let second = reg.historical(0);
        assert_eq!(second.task_count, 2);
        assert!(second.total_elapsed >= first.total_elapsed);
        assert_eq!(second.total_elapsed, 4.0);
    }

    #[test]
    fn global_stats_reports_every_slot() {
        let reg = LoadRegistry::new(3);
        reg.push_estimate(1, 10.0);
        reg.record_completion(2, 0.5);

        let stats = reg.global_stats();
        assert_eq!(stats.per_es.len(), 3);
        assert_eq!(stats.per_es[1].1, 10.0);
        assert_eq!(stats.per_es[2].0.task_count, 1);

        let rendered = stats.to_string();
        assert!(rendered.contains("ES 1"));
        assert!(rendered.contains("ES 2"));
    }

    #[test]
    fn concurrent_push_pop_across_threads_stays_consistent() {
        use std::sync::Arc;
        let reg = Arc::new(LoadRegistry::new(1));
        let mut handles = vec![];
        for _ in 0..8 {
            let reg = Arc::clone(&reg);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    reg.push_estimate(0, 1.0);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.estimated_count(0), 1600);
        assert_eq!(reg.estimated_load(0), 1600.0);

        let mut popped = 0;
        while reg.pop_estimate(0).is_some() {
            popped += 1;
        }
        assert_eq!(popped, 1600);
        assert_eq!(reg.estimated_load(0), 0.0);
    }
}
