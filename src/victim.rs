//! Victim selection: a pure function mapping a registry snapshot to the peer
//! with the most estimated outstanding work.

use crate::registry::LoadRegistry;

/// Which table [`select_victim`] reads.
///
/// The factory picks one of these at construction time, not per-iteration
/// (`spec.md` §9) — the richer, live-estimate-tracking scheme is the
/// specification's default; `Historical` reproduces the simpler variant
/// named as a subset in the Open Questions, useful when a caller's pools
/// don't push cost estimates at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimStrategy {
    /// Rank by live `estimated_load` (pending cost-estimate sum).
    Live,
    /// Rank by historical `total_elapsed`, gated on `task_count > 0`.
    Historical,
}

impl Default for VictimStrategy {
    fn default() -> Self {
        VictimStrategy::Live
    }
}

/// Select the peer with the largest estimated outstanding work, excluding
/// `self_rank`.
///
/// `argmax` over `i != self_rank` of the chosen metric, restricted to
/// strictly positive values; `None` if no peer qualifies. Ties — including
/// the degenerate all-zero case, which never reaches here since `0.0` is
/// excluded — go to the lowest index, because the scan uses a strict `>`
/// and keeps the first rank it sees hit the current maximum.
pub fn select_victim(registry: &LoadRegistry, self_rank: usize, n: usize, strategy: VictimStrategy) -> Option<usize> {
    let mut victim = None;
    let mut max_load = 0.0;

    for i in 0..n {
        if i == self_rank {
            continue;
        }
        let cur = match strategy {
            VictimStrategy::Live => registry.estimated_load(i),
            VictimStrategy::Historical => {
                let hist = registry.historical(i);
                if hist.task_count > 0 {
                    hist.total_elapsed
                } else {
                    0.0
                }
            }
        };
        if cur > max_load {
            max_load = cur;
            victim = Some(i);
        }
    }

    victim
}
