// src/services/geo.rs
// DOCUMENTATION: Great-circle distance helpers
// PURPOSE: Single distance implementation shared by aggregation and proximity

use crate::models::Coordinate;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two coordinates in meters.
/// Pure; never fails.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    // Clamp guards asin against h drifting past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Distance in kilometers, rounded to 2 decimals for display and filtering
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    round_to(distance_meters(a, b) / 1000.0, 2)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = Coordinate::new(12.0, 77.0);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // Berlin to Paris is roughly 878 km
        let berlin = Coordinate::new(52.5200, 13.4050);
        let paris = Coordinate::new(48.8566, 2.3522);
        let km = distance_meters(berlin, paris) / 1000.0;
        assert!((km - 878.0).abs() < 5.0, "got {}", km);
    }

    #[test]
    fn test_symmetry() {
        let a = Coordinate::new(40.4168, -3.7038);
        let b = Coordinate::new(41.6488, -0.8891);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn test_additive_along_meridian() {
        let a = Coordinate::new(10.0, 77.0);
        let b = Coordinate::new(10.5, 77.0);
        let c = Coordinate::new(11.0, 77.0);

        let sum = distance_meters(a, b) + distance_meters(b, c);
        assert!((sum - distance_meters(a, c)).abs() < 1e-3);
    }

    #[test]
    fn test_antipodal_points_do_not_nan() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_meters(a, b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }

    #[test]
    fn test_distance_km_rounding() {
        let origin = Coordinate::new(12.0, 77.0);
        let nearby = Coordinate::new(12.001, 77.0);
        assert_eq!(distance_km(origin, nearby), 0.11);
        assert_eq!(round_to(1.23456, 2), 1.23);
    }
}
