//! Fleet resolution.
//!
//! Determines which fleet scopes the app's fleet-dependent queries. The user
//! either picks a fleet manually or leaves it on automatic, in which case the
//! nearest fleet to the device wins. See [`selection`] for the exact policy.
//!
//! # Architecture
//!
//! ```text
//! selection stream ──► FleetResolver ──► resolved fleet stream
//!                        │      │
//!        FleetDirectory ─┘      └─ LocationProvider
//!        (bounded retry)           (bounded retry)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hailcore::fleet::{FleetResolver, FleetSelection};
//! use hailcore::geo::HaversineDistance;
//!
//! let resolver = FleetResolver::new(directory, location, Arc::new(HaversineDistance));
//! let mut fleets = resolver.resolve_fleet(selection_changes);
//! while let Some(fleet) = fleets.next().await {
//!     println!("Operating fleet: {}", fleet);
//! }
//! resolver.shut_down();
//! ```

mod collaborators;
mod resolver;
pub mod selection;
mod types;

pub use collaborators::{FleetDirectory, FleetDirectoryError, LocationError, LocationProvider};
pub use resolver::{FleetResolver, FleetResolverConfig, ResolvedFleetStream};
pub use selection::{find_manual_fleet, nearest_fleet, rank_fleets, select_fleet, FleetTier, RankedFleet};
pub use types::{
    FleetInfo, FleetSelection, LocationAndHeading, AUTOMATIC_SELECTION, DEFAULT_FLEET_ID,
    DEFAULT_FLEET_NAME,
};
