use serde::{Deserialize, Serialize};
use thiserror::Error;

const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Error, PartialEq)]
pub enum GeofenceError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("invalid radius {0}")]
    InvalidRadius(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeofenceError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(GeofenceError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_MEAN_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

/// Circular office zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    center: GeoPoint,
    radius_m: f64,
}

impl Geofence {
    pub fn new(center: GeoPoint, radius_m: f64) -> Result<Self, GeofenceError> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(GeofenceError::InvalidRadius(radius_m));
        }
        Ok(Self { center, radius_m })
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn distance_m(&self, point: &GeoPoint) -> f64 {
        self.center.distance_m(point)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.distance_m(point) <= self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> Geofence {
        Geofence::new(GeoPoint::new(29.275748, 79.545030).unwrap(), 100.0).unwrap()
    }

    #[test]
    fn center_is_inside() {
        let fence = office();
        assert!(fence.contains(&fence.center()));
        assert_eq!(fence.distance_m(&fence.center()), 0.0);
    }

    #[test]
    fn about_fifty_meters_north_is_inside() {
        // 0.00045 deg of latitude is roughly 50 m
        let p = GeoPoint::new(29.276198, 79.545030).unwrap();
        let d = office().distance_m(&p);
        assert!((d - 50.0).abs() < 1.0, "distance was {d}");
        assert!(office().contains(&p));
    }

    #[test]
    fn a_kilometer_away_is_outside() {
        let p = GeoPoint::new(29.284748, 79.545030).unwrap();
        assert!(office().distance_m(&p) > 990.0);
        assert!(!office().contains(&p));
    }

    #[test]
    fn known_city_distance() {
        // London to Paris is about 344 km
        let london = GeoPoint::new(51.5074, -0.1278).unwrap();
        let paris = GeoPoint::new(48.8566, 2.3522).unwrap();
        let d = london.distance_m(&paris);
        assert!((d - 343_500.0).abs() < 2_000.0, "distance was {d}");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        let center = GeoPoint::new(0.0, 0.0).unwrap();
        assert_eq!(Geofence::new(center, 0.0), Err(GeofenceError::InvalidRadius(0.0)));
        assert!(Geofence::new(center, -3.0).is_err());
    }
}
