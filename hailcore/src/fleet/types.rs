//! Fleet and selection value types.

use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Id of the fallback fleet used when nothing else can be resolved.
pub const DEFAULT_FLEET_ID: &str = "default";

/// Display name of the fallback fleet.
pub const DEFAULT_FLEET_NAME: &str = "Default";

/// Selection string meaning "pick the nearest fleet".
pub const AUTOMATIC_SELECTION: &str = "automatic";

/// A fleet of vehicles as published by the fleet directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetInfo {
    /// Unique fleet id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Geographic center of the operating area. Fleets without one can only
    /// be chosen manually.
    #[serde(default)]
    pub center: Option<LatLng>,
    /// Placeholder fleet with no real vehicles.
    #[serde(default)]
    pub is_phantom: bool,
}

impl FleetInfo {
    /// Create a real fleet.
    pub fn new(id: impl Into<String>, name: impl Into<String>, center: Option<LatLng>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center,
            is_phantom: false,
        }
    }

    /// Create a phantom (placeholder) fleet.
    pub fn phantom(id: impl Into<String>, name: impl Into<String>, center: Option<LatLng>) -> Self {
        Self {
            is_phantom: true,
            ..Self::new(id, name, center)
        }
    }

    /// The fallback fleet.
    pub fn default_fleet() -> Self {
        Self::new(DEFAULT_FLEET_ID, DEFAULT_FLEET_NAME, None)
    }

    /// Whether this is the stock fallback fleet.
    ///
    /// A resolver configured with its own fallback fleet (`[fleet]
    /// default_id`) does not produce this one; use
    /// [`FleetResolverConfig::is_default_fleet`](super::FleetResolverConfig::is_default_fleet)
    /// to recognize that fleet.
    pub fn is_default(&self) -> bool {
        *self == Self::default_fleet()
    }

    /// Whether this fleet takes part in nearest-fleet search.
    pub fn is_locatable(&self) -> bool {
        self.center.is_some()
    }
}

impl std::fmt::Display for FleetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)?;
        if self.is_phantom {
            write!(f, " [phantom]")?;
        }
        Ok(())
    }
}

/// The user's fleet preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FleetSelection {
    /// Pick the nearest fleet.
    #[default]
    Automatic,
    /// Use the fleet with this id, if it exists.
    Manual(String),
}

impl FleetSelection {
    /// Manual selection of `id`.
    pub fn manual(id: impl Into<String>) -> Self {
        Self::Manual(id.into())
    }

    /// Whether this is the automatic selection.
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::Automatic)
    }
}

impl FromStr for FleetSelection {
    type Err = Infallible;

    /// `"automatic"` (any case) or an empty string select automatically;
    /// anything else is a manual fleet id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(AUTOMATIC_SELECTION) {
            Ok(Self::Automatic)
        } else {
            Ok(Self::Manual(s.to_string()))
        }
    }
}

impl std::fmt::Display for FleetSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "{}", AUTOMATIC_SELECTION),
            Self::Manual(id) => write!(f, "{}", id),
        }
    }
}

/// A location fix from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationAndHeading {
    pub location: LatLng,
    /// Bearing in degrees, when the device reports one.
    pub heading: Option<f32>,
}

impl LocationAndHeading {
    /// A fix without heading.
    pub fn new(location: LatLng) -> Self {
        Self {
            location,
            heading: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fleet_sentinel() {
        let fleet = FleetInfo::default_fleet();
        assert_eq!(fleet.id, DEFAULT_FLEET_ID);
        assert!(fleet.is_default());
        assert!(!fleet.is_locatable());
        assert!(!fleet.is_phantom);
        assert!(!FleetInfo::new("f1", "One", None).is_default());
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("automatic".parse::<FleetSelection>(), Ok(FleetSelection::Automatic));
        assert_eq!("AUTOMATIC".parse::<FleetSelection>(), Ok(FleetSelection::Automatic));
        assert_eq!("".parse::<FleetSelection>(), Ok(FleetSelection::Automatic));
        assert_eq!(" f1 ".parse::<FleetSelection>(), Ok(FleetSelection::manual("f1")));
    }

    #[test]
    fn test_selection_display_round_trips_through_parse() {
        let manual = FleetSelection::manual("city-cabs");
        assert_eq!(manual.to_string().parse::<FleetSelection>(), Ok(manual));
        assert_eq!(FleetSelection::Automatic.to_string(), "automatic");
    }

    #[test]
    fn test_fleet_json_defaults() {
        let fleet: FleetInfo = serde_json::from_str(r#"{"id": "f1"}"#).unwrap();
        assert_eq!(fleet, FleetInfo::new("f1", "", None));

        let fleet: FleetInfo = serde_json::from_str(
            r#"{"id": "p", "name": "Ghost", "center": {"latitude": 1.5, "longitude": 2.5}, "is_phantom": true}"#,
        )
        .unwrap();
        assert!(fleet.is_phantom);
        assert_eq!(fleet.center, Some(LatLng::new(1.5, 2.5)));
    }

    #[test]
    fn test_display_marks_phantom() {
        let fleet = FleetInfo::phantom("p1", "Ghost", None);
        assert_eq!(fleet.to_string(), "Ghost (p1) [phantom]");
    }
}
