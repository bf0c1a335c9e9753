//! Map and camera value types passed between screens, the relay, and the
//! renderer.

use std::collections::BTreeMap;

use crate::geo::{LatLng, LatLngBounds};

/// A camera movement for the renderer to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCommand {
    /// Leave the camera where it is.
    NoOp,
    /// Center on a coordinate at the given zoom level.
    CenterAndZoom {
        /// Target center.
        center: LatLng,
        /// Target zoom level.
        zoom: f32,
    },
    /// Fit a bounding box into the viewport.
    FitBounds {
        /// Area that must be visible.
        bounds: LatLngBounds,
        /// Padding around the bounds in pixels.
        padding: u32,
    },
}

impl CameraCommand {
    /// Center on `center` at `zoom`.
    pub fn center_and_zoom(center: LatLng, zoom: f32) -> Self {
        Self::CenterAndZoom { center, zoom }
    }

    /// Fit `bounds` with `padding` pixels around it.
    pub fn fit_bounds(bounds: LatLngBounds, padding: u32) -> Self {
        Self::FitBounds { bounds, padding }
    }

    /// Fit every point of a route or marker set.
    ///
    /// Returns [`CameraCommand::NoOp`] for an empty set.
    pub fn fit_points<I>(points: I, padding: u32) -> Self
    where
        I: IntoIterator<Item = LatLng>,
    {
        match LatLngBounds::from_points(points) {
            Some(bounds) => Self::fit_bounds(bounds, padding),
            None => Self::NoOp,
        }
    }

    /// Whether the command leaves the camera untouched.
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// A camera command as submitted by a screen.
///
/// `force` only affects how the relay treats this submission; it is not
/// remembered with the command.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRequest {
    /// The requested movement.
    pub command: CameraCommand,
    /// Apply even if the user has taken manual control.
    pub force: bool,
}

impl CameraRequest {
    /// A request that respects manual control.
    pub fn new(command: CameraCommand) -> Self {
        Self {
            command,
            force: false,
        }
    }

    /// A request that overrides manual control.
    pub fn forced(command: CameraCommand) -> Self {
        Self {
            command,
            force: true,
        }
    }
}

/// Viewport padding in pixels, leaving room for overlaid UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapPadding {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

/// Renderer settings a screen wants applied to the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Draw the device location dot.
    pub show_my_location: bool,
    /// Allow pan/zoom gestures.
    pub gestures_enabled: bool,
    /// Viewport padding.
    pub padding: MapPadding,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            show_my_location: false,
            gestures_enabled: true,
            padding: MapPadding::default(),
        }
    }
}

/// What a marker represents, which decides its icon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Pickup,
    Destination,
    Vehicle,
    Custom(String),
}

/// A single map marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    /// Icon rotation in degrees, for vehicle markers.
    pub heading: Option<f32>,
    pub kind: MarkerKind,
    pub title: Option<String>,
}

impl Marker {
    /// Create an untitled, unrotated marker.
    pub fn new(kind: MarkerKind, position: LatLng) -> Self {
        Self {
            position,
            heading: None,
            kind,
            title: None,
        }
    }

    /// Set the icon rotation.
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Set the marker title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Full marker set keyed by marker id. Each emission replaces the previous
/// set wholesale.
pub type MarkerMap = BTreeMap<String, Marker>;

/// A polyline drawn on the map (route, driver trail).
#[derive(Debug, Clone, PartialEq)]
pub struct MapPath {
    pub points: Vec<LatLng>,
    /// Stroke width in pixels.
    pub width: f32,
    /// ARGB color.
    pub color: u32,
}

impl MapPath {
    /// Create a path with the given points and style.
    pub fn new(points: Vec<LatLng>, width: f32, color: u32) -> Self {
        Self {
            points,
            width,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_points_empty_is_no_op() {
        assert!(CameraCommand::fit_points(Vec::new(), 10).is_no_op());
    }

    #[test]
    fn test_fit_points_covers_route() {
        let command = CameraCommand::fit_points(
            vec![LatLng::new(1.0, 2.0), LatLng::new(3.0, -1.0)],
            24,
        );
        match command {
            CameraCommand::FitBounds { bounds, padding } => {
                assert_eq!(bounds.southwest, LatLng::new(1.0, -1.0));
                assert_eq!(bounds.northeast, LatLng::new(3.0, 2.0));
                assert_eq!(padding, 24);
            }
            other => panic!("Expected FitBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_request_constructors() {
        let cmd = CameraCommand::center_and_zoom(LatLng::new(0.0, 0.0), 15.0);
        assert!(!CameraRequest::new(cmd.clone()).force);
        assert!(CameraRequest::forced(cmd).force);
    }

    #[test]
    fn test_marker_builder() {
        let marker = Marker::new(MarkerKind::Vehicle, LatLng::new(1.0, 1.0))
            .with_heading(90.0)
            .with_title("Car 12");
        assert_eq!(marker.heading, Some(90.0));
        assert_eq!(marker.title.as_deref(), Some("Car 12"));
    }

    #[test]
    fn test_default_settings_allow_gestures() {
        let settings = MapSettings::default();
        assert!(settings.gestures_enabled);
        assert!(!settings.show_my_location);
    }
}
