//! Geolocation types.
//!
//! Locations follow the GeoJSON point layout: coordinates are stored and
//! serialized as `[longitude, latitude]`, and the `type` member is always
//! `"Point"`.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Errors for coordinates outside the valid WGS84 range.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// Longitude outside -180..=180 or not finite.
    #[error("longitude {0} is out of range")]
    Longitude(f64),
    /// Latitude outside -90..=90 or not finite.
    #[error("latitude {0} is out of range")]
    Latitude(f64),
}

/// A longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl GeoPoint {
    /// Build a point, checking both coordinates are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns `GeoError` naming the offending coordinate.
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Great-circle distance to `other` in meters (haversine).
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lng, point.lat]
    }
}

/// The GeoJSON geometry kind. Stores only ever hold points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryKind {
    /// A single position.
    #[default]
    Point,
}

/// Where a store is: a point plus the human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Always `Point`.
    #[serde(rename = "type", default)]
    pub kind: GeometryKind,
    /// `[lng, lat]`.
    pub coordinates: GeoPoint,
    /// Free-text street address.
    pub address: String,
}

impl Location {
    /// Create a point location.
    #[must_use]
    pub const fn point(coordinates: GeoPoint, address: String) -> Self {
        Self {
            kind: GeometryKind::Point,
            coordinates,
            address,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_location_serializes_as_geojson_point() {
        let location = Location::point(GeoPoint::new(-79.8, 43.2).unwrap(), "1 Main St".into());
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Point",
                "coordinates": [-79.8, 43.2],
                "address": "1 Main St"
            })
        );
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(GeoPoint::new(181.0, 0.0), Err(GeoError::Longitude(181.0)));
        assert_eq!(GeoPoint::new(0.0, -91.0), Err(GeoError::Latitude(-91.0)));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_distance_hamilton_to_toronto() {
        let hamilton = GeoPoint::new(-79.8711, 43.2557).unwrap();
        let toronto = GeoPoint::new(-79.3832, 43.6532).unwrap();
        let km = hamilton.distance_meters(&toronto) / 1000.0;
        assert!((58.0..62.0).contains(&km), "got {km} km");
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = GeoPoint::new(10.0, 10.0).unwrap();
        assert!(p.distance_meters(&p).abs() < 1e-6);
    }
}
