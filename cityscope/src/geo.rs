//! Geographic coordinate types and validation.

use serde::Serialize;
use std::fmt;

/// Valid latitude range in degrees.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range in degrees.
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// Mean Earth radius in kilometres, used for great-circle distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated position in decimal degrees.
///
/// Construction goes through [`LatLng::new`], so a `LatLng` held anywhere in
/// the system is always within range. Raw provider records carry unchecked
/// `f64` pairs instead and are converted at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl LatLng {
    /// Creates a position, rejecting out-of-range (or NaN) coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !(MIN_LNG..=MAX_LNG).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Creates a position from coordinates already known to be in range.
    ///
    /// Only for crate-internal constants (e.g. the default viewport).
    pub(crate) const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another position in kilometres (haversine).
    pub fn distance_km(&self, other: &LatLng) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Midpoint between this position and another, by linear interpolation.
    ///
    /// Good enough at city scale; not a geodesic midpoint.
    pub fn midpoint(&self, other: &LatLng) -> LatLng {
        Self {
            latitude: (self.latitude + other.latitude) / 2.0,
            longitude: (self.longitude + other.longitude) / 2.0,
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Errors that can occur during coordinate validation.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude is outside valid range (-90.0 to 90.0)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            GeoError::InvalidLongitude(lng) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lng, MIN_LNG, MAX_LNG
                )
            }
        }
    }
}

impl std::error::Error for GeoError {}
