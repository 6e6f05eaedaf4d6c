//! Tracker telemetry for observability.
//!
//! Lock-free counters recorded by the tracking controller on every fetch,
//! watch sample and gate decision.
//!
//! ```text
//! TrackingController ─────► TrackerMetrics ─────► TrackerMetricsSnapshot ─────► CLI / UI
//!                           (atomic counters)     (point-in-time copy)
//! ```

mod metrics;
mod snapshot;

pub use metrics::TrackerMetrics;
pub use snapshot::TrackerMetricsSnapshot;
