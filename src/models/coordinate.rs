// src/models/coordinate.rs
// DOCUMENTATION: Geographic coordinate shared by every component
// PURPOSE: Lat/lng pair with range invariant and conversions for map output

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A WGS84 point in degrees.
/// Invariant: lat in [-90, 90], lng in [-180, 180], both finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinate {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Checked constructor used when reading third-party payloads
    pub fn try_new(lat: f64, lng: f64) -> Option<Self> {
        let coordinate = Self { lat, lng };
        coordinate.is_valid().then_some(coordinate)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Integer grid cell at `places` decimal digits, used as a cache key.
    /// 4 digits is roughly an 11 m cell.
    pub fn grid_key(&self, places: i32) -> (i64, i64) {
        let factor = 10f64.powi(places);
        (
            (self.lat * factor).round() as i64,
            (self.lng * factor).round() as i64,
        )
    }
}

impl From<Coordinate> for geo_types::Point<f64> {
    fn from(coordinate: Coordinate) -> Self {
        // geo-types points are (x = lng, y = lat)
        geo_types::Point::new(coordinate.lng, coordinate.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_invariant() {
        assert!(Coordinate::try_new(12.0, 77.0).is_some());
        assert!(Coordinate::try_new(-90.0, 180.0).is_some());
        assert!(Coordinate::try_new(90.1, 0.0).is_none());
        assert!(Coordinate::try_new(0.0, -180.5).is_none());
        assert!(Coordinate::try_new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_validator_matches_invariant() {
        assert!(Coordinate::new(45.0, 100.0).validate().is_ok());
        assert!(Coordinate::new(91.0, 100.0).validate().is_err());
    }

    #[test]
    fn test_grid_key_rounds_to_cell() {
        let a = Coordinate::new(40.41681, -3.70379);
        let b = Coordinate::new(40.41679, -3.70381);
        let c = Coordinate::new(40.4169, -3.7038);

        assert_eq!(a.grid_key(4), b.grid_key(4));
        assert_ne!(a.grid_key(4), c.grid_key(4));
    }

    #[test]
    fn test_point_axis_order() {
        let point: geo_types::Point<f64> = Coordinate::new(12.5, 77.25).into();
        assert_eq!(point.x(), 77.25);
        assert_eq!(point.y(), 12.5);
    }
}
