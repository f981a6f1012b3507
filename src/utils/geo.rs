//! Great-circle distance and the radius filter used for route consolidation.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius used when looking for bookings that can share a trip.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Anything with a pickup and a drop point can be matched against a reference location.
pub trait RouteEndpoints {
    fn pickup_point(&self) -> GeoPoint;
    fn drop_point(&self) -> GeoPoint;
}

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
///
/// Inputs are not range-checked.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Check if a point is within the given radius of a reference point (inclusive)
pub fn is_within_radius(point: GeoPoint, center: GeoPoint, max_radius_km: f64) -> bool {
    point.distance_km(&center) <= max_radius_km
}

/// Keep the candidates whose pickup OR drop point lies within `radius_km`
/// of `target`. Input order is preserved. `None` means [`DEFAULT_RADIUS_KM`].
pub fn find_nearby<T, I>(target: GeoPoint, candidates: I, radius_km: Option<f64>) -> Vec<T>
where
    T: RouteEndpoints,
    I: IntoIterator<Item = T>,
{
    let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);

    candidates
        .into_iter()
        .filter(|candidate| {
            is_within_radius(candidate.pickup_point(), target, radius_km)
                || is_within_radius(candidate.drop_point(), target, radius_km)
        })
        .collect()
}

/// Coerce a coordinate given as text or number into degrees.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
