//! Coordinates and great-circle math on a spherical Earth

use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometers
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(self, other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(coord: Coordinate) -> Self {
        Point::new(coord.longitude, coord.latitude)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(point: Point<f64>) -> Self {
        Coordinate::new(point.y(), point.x())
    }
}

/// Haversine distance between two coordinates in kilometers.
///
/// Identical coordinates yield exactly `0.0`.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `h` slightly above 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `from` towards `to` in degrees, normalised to [0, 360)
pub fn initial_bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_york_to_los_angeles() {
        let nyc = Coordinate::new(40.7128, -74.006);
        let la = Coordinate::new(34.0522, -118.2437);

        let distance = haversine_distance(&nyc, &la);
        assert!(distance > 3900.0 && distance < 4000.0, "got {distance}");
    }

    #[test]
    fn test_identical_coordinates_are_zero() {
        let coord = Coordinate::new(40.7128, -74.006);
        assert_eq!(haversine_distance(&coord, &coord), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);
        assert!((haversine_distance(&a, &b) - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!(initial_bearing(&origin, &Coordinate::new(1.0, 0.0)).abs() < 1e-9);
        assert!((initial_bearing(&origin, &Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing(&origin, &Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing(&origin, &Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_conversion_keeps_axis_order() {
        let coord = Coordinate::new(51.5, -0.12);
        let point: Point<f64> = coord.into();
        assert_eq!(point.x(), -0.12);
        assert_eq!(point.y(), 51.5);
        assert_eq!(Coordinate::from(point), coord);
    }

    #[test]
    fn test_validity_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_json_keeps_every_bit() {
        let coord = Coordinate::new(-33.868_820_000_000_01, 111.131_016_644_558_71);
        let json = serde_json::to_string(&coord).unwrap();
        let parsed: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.latitude.to_bits(), coord.latitude.to_bits());
        assert_eq!(parsed.longitude.to_bits(), coord.longitude.to_bits());
    }

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0..=90.0f64, -180.0..=180.0f64).prop_map(|(lat, lng)| Coordinate::new(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_haversine_is_symmetric(a in coordinate(), b in coordinate()) {
            let ab = haversine_distance(&a, &b);
            let ba = haversine_distance(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-9);
        }

        #[test]
        fn prop_haversine_triangle_inequality(
            a in coordinate(),
            b in coordinate(),
            c in coordinate(),
        ) {
            let ac = haversine_distance(&a, &c);
            let ab = haversine_distance(&a, &b);
            let bc = haversine_distance(&b, &c);
            prop_assert!(ac <= ab + bc + 1e-6);
        }

        #[test]
        fn prop_haversine_bounded_by_half_circumference(a in coordinate(), b in coordinate()) {
            let d = haversine_distance(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }

        #[test]
        fn prop_bearing_in_range(a in coordinate(), b in coordinate()) {
            let bearing = initial_bearing(&a, &b);
            prop_assert!((0.0..360.0).contains(&bearing));
        }

        #[test]
        fn prop_json_round_trip_is_exact(a in coordinate()) {
            let parsed: Coordinate = serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
            prop_assert_eq!(parsed, a);
        }
    }
}
