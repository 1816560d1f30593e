//! Great-circle distance for the store locator.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors for out-of-range coordinates.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    #[error("latitude must be between -90 and 90, got {0}")]
    Latitude(f64),
    #[error("longitude must be between -180 and 180, got {0}")]
    Longitude(f64),
}

/// Haversine distance in kilometres between two latitude/longitude pairs
/// given in degrees.
///
/// ```
/// use loyalty_core::calculate_distance;
///
/// assert_eq!(calculate_distance(0.0, 0.0, 0.0, 0.0), 0.0);
/// ```
#[must_use]
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // Absolute deltas keep the result bit-for-bit symmetric.
    let half_d_lat = (lat2 - lat1).abs().to_radians() / 2.0;
    let half_d_lon = (lon2 - lon1).abs().to_radians() / 2.0;

    let a = half_d_lat.sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * half_d_lon.sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// A validated point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build coordinates from degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] when either component is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Distance to `other` in kilometres.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        calculate_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    const POINTS: [(f64, f64); 5] = [
        (40.7128, -74.0060),
        (51.5074, -0.1278),
        (-33.8688, 151.2093),
        (35.6762, 139.6503),
        (0.0, 0.0),
    ];

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(calculate_distance(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(calculate_distance(40.7128, -74.0060, 40.7128, -74.0060), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        for (lat1, lon1) in POINTS {
            for (lat2, lon2) in POINTS {
                assert_eq!(
                    calculate_distance(lat1, lon1, lat2, lon2),
                    calculate_distance(lat2, lon2, lat1, lon1)
                );
            }
        }
    }

    #[test]
    fn test_known_distance() {
        // New York to London is roughly 5570 km.
        let d = calculate_distance(40.7128, -74.0060, 51.5074, -0.1278);
        assert!((d - 5570.0).abs() < 10.0, "{d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = calculate_distance(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "{d}");
    }

    #[test]
    fn test_coordinates_validate_range() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());

        let a = Coordinates::new(40.7128, -74.0060).unwrap();
        let b = Coordinates::new(51.5074, -0.1278).unwrap();
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
    }
}
