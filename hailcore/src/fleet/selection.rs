//! Fleet selection policy.
//!
//! Pure functions shared by the resolver and the CLI:
//!
//! 1. A manual selection wins if its id is in the list (first match).
//! 2. Otherwise the nearest locatable real fleet wins.
//! 3. Otherwise the nearest locatable phantom fleet wins.
//! 4. Otherwise the default fleet is used.
//!
//! Equal distances keep directory order: the first listed fleet wins.

use super::types::{FleetInfo, FleetSelection};
use crate::geo::{DistanceCalculator, LatLng};

/// Preference tier for nearest-fleet search. Lower tiers win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FleetTier {
    /// Fleet with real vehicles.
    Real,
    /// Placeholder fleet.
    Phantom,
}

impl FleetTier {
    /// Tier of `fleet`.
    pub fn of(fleet: &FleetInfo) -> Self {
        if fleet.is_phantom {
            FleetTier::Phantom
        } else {
            FleetTier::Real
        }
    }
}

/// A locatable fleet with its distance from the device.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFleet<'a> {
    pub fleet: &'a FleetInfo,
    pub distance_meters: f64,
    pub tier: FleetTier,
}

/// Find a fleet by id. First match wins.
pub fn find_manual_fleet<'a>(fleets: &'a [FleetInfo], id: &str) -> Option<&'a FleetInfo> {
    fleets.iter().find(|fleet| fleet.id == id)
}

/// Rank every locatable fleet: real fleets before phantom ones, nearest
/// first within a tier. Fleets without a center are left out.
///
/// The sort is stable, so equidistant fleets keep their input order.
pub fn rank_fleets<'a>(
    fleets: &'a [FleetInfo],
    location: LatLng,
    distance: &dyn DistanceCalculator,
) -> Vec<RankedFleet<'a>> {
    let mut ranked: Vec<RankedFleet<'a>> = fleets
        .iter()
        .filter_map(|fleet| {
            let center = fleet.center?;
            Some(RankedFleet {
                fleet,
                distance_meters: distance.distance_meters(location, center),
                tier: FleetTier::of(fleet),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then(a.distance_meters.total_cmp(&b.distance_meters))
    });
    ranked
}

/// The preferred locatable fleet for `location`, if any fleet is locatable.
pub fn nearest_fleet<'a>(
    fleets: &'a [FleetInfo],
    location: LatLng,
    distance: &dyn DistanceCalculator,
) -> Option<&'a FleetInfo> {
    rank_fleets(fleets, location, distance)
        .first()
        .map(|ranked| ranked.fleet)
}

/// Apply the full selection policy.
///
/// `location` is only consulted when automatic resolution is needed; `None`
/// there means the device location is unavailable and the default wins.
pub fn select_fleet(
    selection: &FleetSelection,
    fleets: &[FleetInfo],
    location: Option<LatLng>,
    distance: &dyn DistanceCalculator,
    default_fleet: &FleetInfo,
) -> FleetInfo {
    if let FleetSelection::Manual(id) = selection {
        if let Some(fleet) = find_manual_fleet(fleets, id) {
            return fleet.clone();
        }
    }

    location
        .and_then(|location| nearest_fleet(fleets, location, distance))
        .unwrap_or(default_fleet)
        .clone()
}
