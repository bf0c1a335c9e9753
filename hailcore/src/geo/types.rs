//! Geographic value types shared by the fleet and camera modules.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl LatLng {
    /// Create a new coordinate.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Axis-aligned geographic bounding box.
///
/// Does not handle boxes that cross the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    /// South-west corner (minimum latitude and longitude).
    pub southwest: LatLng,
    /// North-east corner (maximum latitude and longitude).
    pub northeast: LatLng,
}

impl LatLngBounds {
    /// Create a bounding box from its corners.
    pub fn new(southwest: LatLng, northeast: LatLng) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Grow the box to include `point`.
    pub fn extend(&mut self, point: LatLng) {
        self.southwest.latitude = self.southwest.latitude.min(point.latitude);
        self.southwest.longitude = self.southwest.longitude.min(point.longitude);
        self.northeast.latitude = self.northeast.latitude.max(point.latitude);
        self.northeast.longitude = self.northeast.longitude.max(point.longitude);
    }

    /// Geometric center of the box.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.southwest.latitude + self.northeast.latitude) / 2.0,
            (self.southwest.longitude + self.northeast.longitude) / 2.0,
        )
    }

    /// Whether `point` lies inside the box (edges included).
    pub fn contains(&self, point: LatLng) -> bool {
        (self.southwest.latitude..=self.northeast.latitude).contains(&point.latitude)
            && (self.southwest.longitude..=self.northeast.longitude).contains(&point.longitude)
    }
}
