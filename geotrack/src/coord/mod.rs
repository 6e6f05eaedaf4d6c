//! Great-circle geometry on a spherical Earth.
//!
//! Provides the [`Coordinate`] value type and the distance calculation used
//! to decide whether a new sample moved far enough to be worth keeping.
//! All functions are pure and safe to call from any thread.

mod types;

pub use types::{Coordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters.
///
/// Uses the haversine formula. The result is symmetric, never negative and
/// exactly zero for identical inputs.
///
/// # Example
///
/// ```
/// use geotrack::coord::{distance_meters, Coordinate};
///
/// // One degree of latitude is ~111.2 km
/// let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points
    let c = 2.0 * h.sqrt().clamp(0.0, 1.0).asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` towards `to`, in degrees.
///
/// Returns 0..360 where 0 = North and 90 = East. Identical points yield 0.
pub fn initial_bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Point reached by travelling `distance_m` meters from `origin` along
/// the great circle starting at `bearing_deg`.
///
/// Longitude is normalized to -180..180.
pub fn destination(origin: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let angular = distance_m / EARTH_RADIUS_M;
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    let lon_deg = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    Coordinate::new(lat2.to_degrees(), lon_deg)
}

fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TAIPEI: Coordinate = Coordinate::new(25.0330, 121.5654);

    #[test]
    fn test_distance_same_point_is_zero() {
        assert_eq!(distance_meters(TAIPEI, TAIPEI), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let west = Coordinate::new(0.0, 179.999);
        let east = Coordinate::new(0.0, -179.999);
        let d = distance_meters(west, east);
        // 0.002 degrees of longitude at the equator
        assert!((d - 222.39).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_distance_antipodal_is_finite() {
        let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((initial_bearing(origin, Coordinate::new(1.0, 0.0)) - 0.0).abs() < 0.01);
        assert!((initial_bearing(origin, Coordinate::new(0.0, 1.0)) - 90.0).abs() < 0.01);
        assert!((initial_bearing(origin, Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 0.01);
        assert!((initial_bearing(origin, Coordinate::new(0.0, -1.0)) - 270.0).abs() < 0.01);
    }

    #[test]
    fn test_destination_distance_matches() {
        for bearing in [0.0, 45.0, 90.0, 200.0, 315.0] {
            let dest = destination(TAIPEI, bearing, 80.0);
            let d = distance_meters(TAIPEI, dest);
            assert!((d - 80.0).abs() < 1e-3, "bearing {}: got {}", bearing, d);
        }
    }

    #[test]
    fn test_destination_wraps_longitude() {
        let dest = destination(Coordinate::new(0.0, 179.9999), 90.0, 1_000.0);
        assert!(dest.longitude < -179.0, "got {}", dest.longitude);
    }

    proptest! {
        #[test]
        fn prop_distance_identity(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let a = Coordinate::new(lat, lon);
            prop_assert_eq!(distance_meters(a, a), 0.0);
        }

        #[test]
        fn prop_distance_symmetric_and_non_negative(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat1, lon1);
            let b = Coordinate::new(lat2, lon2);
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() <= 1e-6);
        }
    }
}
