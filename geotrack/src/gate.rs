//! Update gate: decides what to do with a newly observed sample.
//!
//! Two independent throttle tiers decouple "is this sample worth keeping"
//! from "is this sample worth paying a downstream call for":
//!
//! ```text
//!                 ┌──────────────┐  accept   ┌────────────────┐  fire
//! sample ───────► │ accept floor │ ────────► │ callback window│ ──────► notify
//!                 │   (5s) +     │           │     (10s)      │
//!                 │  distance    │           └────────────────┘
//!                 └──────────────┘
//! ```
//!
//! The gate itself is pure. The caller owns the [`TimingLedger`] and applies
//! a decision with [`TimingLedger::record`] once it has committed the sample.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::coord::{distance_meters, Coordinate};
use crate::tracking::TrackingOptions;

/// Minimum spacing between two accepted non-forced samples.
///
/// A hard floor against update storms from a noisy watcher, independent of
/// the configured distance threshold.
pub const ACCEPT_FLOOR: Duration = Duration::from_secs(5);

/// Minimum spacing between two non-forced downstream notifications.
pub const CALLBACK_WINDOW: Duration = Duration::from_secs(10);

/// Timestamps the gate needs to apply its throttles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingLedger {
    /// When a sample was last accepted.
    pub last_accepted_sample_at: Option<Instant>,
    /// When the downstream callback last fired.
    pub last_callback_fired_at: Option<Instant>,
}

impl TimingLedger {
    /// Apply the timing side effects of `decision` taken at `now`.
    pub fn record(&mut self, decision: &GateDecision, now: Instant) {
        if decision.accept_sample {
            self.last_accepted_sample_at = Some(now);
        }
        if decision.fire_callback {
            self.last_callback_fired_at = Some(now);
        }
    }
}

/// Why a sample was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Arrived inside the accept floor after the previous accepted sample.
    AcceptFloor,
    /// Moved less than the configured distance threshold.
    BelowThreshold,
    /// Distance-based acceptance is switched off and the attempt was not forced.
    DistanceTrackingDisabled,
}

impl RejectReason {
    /// Short description for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::AcceptFloor => "accept_floor",
            RejectReason::BelowThreshold => "below_threshold",
            RejectReason::DistanceTrackingDisabled => "distance_tracking_disabled",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of [`UpdateGate::decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    /// Make the sample the new current location.
    pub accept_sample: bool,
    /// Notify downstream consumers.
    pub fire_callback: bool,
    /// Distance from the current location in meters (0 for the first sample).
    pub distance_delta: f64,
    /// Set whenever `accept_sample` is false.
    pub reject_reason: Option<RejectReason>,
}

/// Pure two-tier throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateGate {
    accept_floor: Duration,
    callback_window: Duration,
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateGate {
    /// Gate using [`ACCEPT_FLOOR`] and [`CALLBACK_WINDOW`].
    pub const fn new() -> Self {
        Self {
            accept_floor: ACCEPT_FLOOR,
            callback_window: CALLBACK_WINDOW,
        }
    }

    /// Gate with custom throttle windows.
    pub const fn with_windows(accept_floor: Duration, callback_window: Duration) -> Self {
        Self {
            accept_floor,
            callback_window,
        }
    }

    /// The accept floor in use.
    pub fn accept_floor(&self) -> Duration {
        self.accept_floor
    }

    /// The callback window in use.
    pub fn callback_window(&self) -> Duration {
        self.callback_window
    }

    /// Decide whether to accept `sample` and whether to notify.
    ///
    /// `current` is the current location; `None` marks the first sample,
    /// which is always accepted. Forced attempts skip the accept floor and
    /// the callback window but are still measured.
    pub fn decide(
        &self,
        sample: Coordinate,
        current: Option<Coordinate>,
        ledger: &TimingLedger,
        options: &TrackingOptions,
        forced: bool,
        now: Instant,
    ) -> GateDecision {
        let is_first = current.is_none();
        let distance_delta = current.map_or(0.0, |c| distance_meters(c, sample));

        let reject_reason = if is_first || forced {
            None
        } else if ledger
            .last_accepted_sample_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.accept_floor)
        {
            Some(RejectReason::AcceptFloor)
        } else if !options.enable_distance_tracking {
            Some(RejectReason::DistanceTrackingDisabled)
        } else if distance_delta < options.min_distance_threshold_m {
            Some(RejectReason::BelowThreshold)
        } else {
            None
        };

        let accept_sample = reject_reason.is_none();
        let fire_callback = accept_sample
            && (forced
                || ledger
                    .last_callback_fired_at
                    .map_or(true, |at| now.saturating_duration_since(at) >= self.callback_window));

        GateDecision {
            accept_sample,
            fire_callback,
            distance_delta,
            reject_reason,
        }
    }
}
