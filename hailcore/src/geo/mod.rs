//! Geographic primitives.
//!
//! Provides the coordinate types used across the crate and the distance
//! calculation the fleet resolver uses for nearest-neighbour search.

mod types;

pub use types::{LatLng, LatLngBounds};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Computes the distance between two coordinates.
///
/// Implementations must be deterministic: the fleet resolver relies on equal
/// inputs producing equal distances for its tie-break.
pub trait DistanceCalculator: Send + Sync {
    /// Distance from `a` to `b` in meters.
    fn distance_meters(&self, a: LatLng, b: LatLng) -> f64;
}

/// Great-circle distance on a spherical Earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl DistanceCalculator for HaversineDistance {
    fn distance_meters(&self, a: LatLng, b: LatLng) -> f64 {
        haversine_meters(a, b)
    }
}

/// Calculate the great-circle distance between two coordinates.
///
/// Uses the haversine formula, which stays accurate over the short distances
/// between a rider and nearby fleet centers.
///
/// # Example
///
/// ```
/// use hailcore::geo::{haversine_meters, LatLng};
///
/// // One degree of latitude is roughly 111 km
/// let dist = haversine_meters(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
/// assert!((dist - 111_195.0).abs() < 100.0);
/// ```
pub fn haversine_meters(from: LatLng, to: LatLng) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards against a > 1.0 from rounding near antipodes
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}
