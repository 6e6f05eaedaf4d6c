//! INI serialization of tracking options.

use crate::tracking::TrackingOptions;

/// Render `options` as a commented INI document.
pub fn to_ini_string(options: &TrackingOptions) -> String {
    format!(
        "\
; geotrack configuration

[tracking]
; Period of the refresh timer
update_interval_ms = {update_interval_ms}
; Minimum movement before a non-forced sample replaces the current location
min_distance_threshold_m = {min_distance}
enable_periodic_update = {periodic}
enable_distance_tracking = {distance}
enable_high_accuracy = {high_accuracy}
; Upper bound on each provider request
timeout_ms = {timeout_ms}
; Oldest cached fix the provider may return
maximum_age_ms = {maximum_age_ms}
",
        update_interval_ms = options.update_interval.as_millis(),
        min_distance = options.min_distance_threshold_m,
        periodic = options.enable_periodic_update,
        distance = options.enable_distance_tracking,
        high_accuracy = options.enable_high_accuracy,
        timeout_ms = options.timeout.as_millis(),
        maximum_age_ms = options.maximum_age.as_millis(),
    )
}
