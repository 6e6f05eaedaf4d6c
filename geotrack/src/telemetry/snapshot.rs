//! Point-in-time copy of tracker counters.

use serde::Serialize;

/// Plain copy of [`TrackerMetrics`](super::TrackerMetrics) counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerMetricsSnapshot {
    pub provider_fetches: u64,
    pub provider_errors: u64,
    pub watch_samples: u64,
    pub samples_accepted: u64,
    pub samples_rejected: u64,
    pub callbacks_fired: u64,
    pub attempts_dropped: u64,
}

impl TrackerMetricsSnapshot {
    /// Fraction of gated samples that were accepted (0 when none were gated).
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.samples_accepted + self.samples_rejected;
        if total == 0 {
            0.0
        } else {
            self.samples_accepted as f64 / total as f64
        }
    }
}
