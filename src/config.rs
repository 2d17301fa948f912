//! Scheduler configuration.
//!
//! The core exposes exactly one tunable: `event_freq`, the number of
//! pop/steal iterations between stop-flag and event-hook checks. Everything
//! else (pool count, strategy) is a constructor argument, not configuration.

/// Configuration read by a scheduler at `init` time.
///
/// Mirrors what the source reads out of an opaque `ABT_sched_config` via
/// `ABT_sched_config_read` — here it's just a struct field, since there's no
/// C-style config object to marshal through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    event_freq: u32,
}

/// Default steps between housekeeping checks, matching the factory default.
pub const DEFAULT_EVENT_FREQ: u32 = 10;

impl SchedulerConfig {
    /// Construct a config with the given `event_freq`.
    ///
    /// `event_freq` of `0` is coerced to `1` — a scheduler that never checks
    /// its stop flag can't terminate.
    pub fn new(event_freq: u32) -> Self {
        Self {
            event_freq: event_freq.max(1),
        }
    }

    /// Builder-style override of `event_freq`.
    pub fn with_event_freq(mut self, event_freq: u32) -> Self {
        self.event_freq = event_freq.max(1);
        self
    }

    /// Steps between stop/event-hook checks.
    pub fn event_freq(&self) -> u32 {
        self.event_freq
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_FREQ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_event_freq_is_ten() {
        assert_eq!(SchedulerConfig::default().event_freq(), 10);
    }

    #[test]
    fn zero_event_freq_coerced_to_one() {
        assert_eq!(SchedulerConfig::new(0).event_freq(), 1);
    }

    #[test]
    fn builder_overrides_event_freq() {
        let cfg = SchedulerConfig::default().with_event_freq(42);
        assert_eq!(cfg.event_freq(), 42);
    }
}
