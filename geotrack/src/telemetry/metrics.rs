//! Lock-free atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::TrackerMetricsSnapshot;
use crate::gate::GateDecision;

/// Counters for one tracking controller.
///
/// All operations use `Relaxed` ordering: the counters are independent
/// measurements and nothing synchronizes on them.
#[derive(Debug, Default)]
pub struct TrackerMetrics {
    provider_fetches: AtomicU64,
    provider_errors: AtomicU64,
    watch_samples: AtomicU64,
    samples_accepted: AtomicU64,
    samples_rejected: AtomicU64,
    callbacks_fired: AtomicU64,
    attempts_dropped: AtomicU64,
}

impl TrackerMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-shot provider fetch was started.
    pub fn fetch_started(&self) {
        self.provider_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// The provider reported an error (one-shot or watch).
    pub fn provider_error(&self) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// A watch sample arrived.
    pub fn watch_sample(&self) {
        self.watch_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// An attempt was dropped because another was in flight.
    pub fn attempt_dropped(&self) {
        self.attempts_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a gate decision.
    pub fn decision(&self, decision: &GateDecision) {
        if decision.accept_sample {
            self.samples_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.samples_rejected.fetch_add(1, Ordering::Relaxed);
        }
        if decision.fire_callback {
            self.callbacks_fired.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> TrackerMetricsSnapshot {
        TrackerMetricsSnapshot {
            provider_fetches: self.provider_fetches.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
            watch_samples: self.watch_samples.load(Ordering::Relaxed),
            samples_accepted: self.samples_accepted.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            callbacks_fired: self.callbacks_fired.load(Ordering::Relaxed),
            attempts_dropped: self.attempts_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RejectReason;

    #[test]
    fn test_decision_counts() {
        let metrics = TrackerMetrics::new();

        metrics.decision(&GateDecision {
            accept_sample: true,
            fire_callback: true,
            distance_delta: 0.0,
            reject_reason: None,
        });
        metrics.decision(&GateDecision {
            accept_sample: false,
            fire_callback: false,
            distance_delta: 4.0,
            reject_reason: Some(RejectReason::BelowThreshold),
        });

        let snap = metrics.snapshot();
        assert_eq!(snap.samples_accepted, 1);
        assert_eq!(snap.samples_rejected, 1);
        assert_eq!(snap.callbacks_fired, 1);
    }

    #[test]
    fn test_simple_counters() {
        let metrics = TrackerMetrics::new();
        metrics.fetch_started();
        metrics.fetch_started();
        metrics.provider_error();
        metrics.watch_sample();
        metrics.attempt_dropped();

        let snap = metrics.snapshot();
        assert_eq!(snap.provider_fetches, 2);
        assert_eq!(snap.provider_errors, 1);
        assert_eq!(snap.watch_samples, 1);
        assert_eq!(snap.attempts_dropped, 1);
    }
}
