//! INI parsing: the single place where key names map to option fields.

use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::TRACKING_SECTION;
use crate::tracking::TrackingOptions;

/// Parse an `Ini` into tracking options.
///
/// Starts from `TrackingOptions::default()` and overlays any values found.
pub fn parse_ini(ini: &Ini) -> Result<TrackingOptions, ConfigFileError> {
    let mut options = TrackingOptions::default();

    let Some(section) = ini.section(Some(TRACKING_SECTION)) else {
        return Ok(options);
    };

    if let Some(ms) = parse_millis(section, "update_interval_ms")? {
        options.update_interval = ms;
    }
    if let Some(v) = section.get("min_distance_threshold_m") {
        let meters: f64 = v
            .trim()
            .parse()
            .ok()
            .filter(|m: &f64| m.is_finite() && *m >= 0.0)
            .ok_or_else(|| {
                invalid(
                    "min_distance_threshold_m",
                    v,
                    "expected a non-negative number of meters",
                )
            })?;
        options.min_distance_threshold_m = meters;
    }
    if let Some(b) = parse_flag(section, "enable_periodic_update")? {
        options.enable_periodic_update = b;
    }
    if let Some(b) = parse_flag(section, "enable_distance_tracking")? {
        options.enable_distance_tracking = b;
    }
    if let Some(b) = parse_flag(section, "enable_high_accuracy")? {
        options.enable_high_accuracy = b;
    }
    if let Some(ms) = parse_millis(section, "timeout_ms")? {
        options.timeout = ms;
    }
    if let Some(v) = section.get("maximum_age_ms") {
        let ms: u64 = v
            .trim()
            .parse()
            .map_err(|_| invalid("maximum_age_ms", v, "expected milliseconds"))?;
        options.maximum_age = Duration::from_millis(ms);
    }

    Ok(options)
}

/// Parse a strictly positive millisecond value.
fn parse_millis(section: &Properties, key: &str) -> Result<Option<Duration>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
        _ => Err(invalid(key, v, "expected a positive number of milliseconds")),
    }
}

/// Parse a boolean. Accepts true/false, yes/no, 1/0, on/off (case-insensitive).
fn parse_flag(section: &Properties, key: &str) -> Result<Option<bool>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(invalid(key, v, "expected true or false")),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: TRACKING_SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
