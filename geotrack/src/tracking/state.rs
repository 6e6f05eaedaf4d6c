//! Observable tracking state and emitted events.

use serde::Serialize;

use crate::coord::Coordinate;
use crate::provider::ProviderError;

/// Point-in-time copy of a controller's tracking state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingSnapshot {
    /// Most recently accepted sample.
    pub current_location: Option<Coordinate>,
    /// The accepted sample before `current_location`.
    pub last_location: Option<Coordinate>,
    /// Whether the timer/watch are armed.
    pub is_tracking: bool,
    /// Sum of accepted distance deltas since the last start.
    pub distance_moved_meters: f64,
    /// Most recent provider failure; cleared by the next successful sample.
    pub last_error: Option<ProviderError>,
    /// A one-shot fetch is outstanding.
    pub loading: bool,
}

/// Emitted whenever the downstream notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationUpdate {
    /// The accepted sample.
    pub location: Coordinate,
    /// Distance from the previous current location in meters.
    pub distance_delta_meters: f64,
    /// Whether the update came from a forced refresh.
    pub forced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_serializes_for_reporting() {
        let snapshot = TrackingSnapshot {
            current_location: Some(Coordinate::new(25.0330, 121.5654)),
            is_tracking: true,
            distance_moved_meters: 80.0,
            last_error: Some(ProviderError::PermissionDenied),
            ..Default::default()
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value["current_location"],
            json!({ "latitude": 25.0330, "longitude": 121.5654 })
        );
        assert_eq!(value["last_location"], serde_json::Value::Null);
        assert_eq!(value["is_tracking"], json!(true));
        assert_eq!(value["last_error"], json!("PermissionDenied"));
    }

    #[test]
    fn test_location_update_serializes() {
        let update = LocationUpdate {
            location: Coordinate::new(1.0, 2.0),
            distance_delta_meters: 12.5,
            forced: true,
        };
        let value = serde_json::to_value(update).unwrap();
        assert_eq!(value["distance_delta_meters"], json!(12.5));
        assert_eq!(value["forced"], json!(true));
    }
}
