//! Tracking configuration.

use std::time::Duration;

use crate::provider::ProviderOptions;

/// Default periodic timer period (30 seconds).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);

/// Default minimum movement for a non-forced sample to be accepted.
pub const DEFAULT_MIN_DISTANCE_THRESHOLD_M: f64 = 50.0;

/// Default per-request provider timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default acceptable age of a cached provider fix (5 seconds).
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_secs(5);

/// Options for a [`TrackingController`](super::TrackingController).
///
/// Every field has a default; callers override only what they need:
///
/// ```
/// use geotrack::tracking::TrackingOptions;
/// use std::time::Duration;
///
/// let options = TrackingOptions::default()
///     .with_update_interval(Duration::from_secs(1))
///     .with_min_distance_threshold_m(25.0);
/// assert!(options.enable_periodic_update);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOptions {
    /// Period of the refresh timer.
    pub update_interval: Duration,
    /// Minimum movement in meters for a non-forced sample to be accepted.
    pub min_distance_threshold_m: f64,
    /// Arm the periodic refresh timer on start.
    pub enable_periodic_update: bool,
    /// Register a continuous watch and accept samples by distance.
    pub enable_distance_tracking: bool,
    /// Ask the provider for its most accurate fix.
    pub enable_high_accuracy: bool,
    /// Upper bound on each provider request.
    pub timeout: Duration,
    /// Oldest cached fix the provider may hand back.
    pub maximum_age: Duration,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            min_distance_threshold_m: DEFAULT_MIN_DISTANCE_THRESHOLD_M,
            enable_periodic_update: true,
            enable_distance_tracking: true,
            enable_high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
        }
    }
}

impl TrackingOptions {
    /// Set the refresh timer period.
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set the distance threshold in meters.
    pub fn with_min_distance_threshold_m(mut self, meters: f64) -> Self {
        self.min_distance_threshold_m = meters;
        self
    }

    /// Enable or disable the refresh timer.
    pub fn with_periodic_update(mut self, enabled: bool) -> Self {
        self.enable_periodic_update = enabled;
        self
    }

    /// Enable or disable the continuous watch.
    pub fn with_distance_tracking(mut self, enabled: bool) -> Self {
        self.enable_distance_tracking = enabled;
        self
    }

    /// Enable or disable high-accuracy fixes.
    pub fn with_high_accuracy(mut self, enabled: bool) -> Self {
        self.enable_high_accuracy = enabled;
        self
    }

    /// Set the per-request provider timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the acceptable cached-fix age.
    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }

    /// Options forwarded to the position provider.
    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: self.timeout,
            maximum_age: self.maximum_age,
        }
    }
}
