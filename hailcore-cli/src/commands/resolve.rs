//! `hailcore resolve`: resolve the operating fleet once.

use std::sync::Arc;

use clap::Args;
use futures::{stream, StreamExt};
use hailcore::config::CoreConfig;
use hailcore::directory::{FixedLocation, JsonFleetDirectory};
use hailcore::fleet::{FleetResolver, FleetSelection};
use hailcore::geo::{haversine_meters, HaversineDistance};

use super::common::{format_distance, FleetSource};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: FleetSource,

    /// Fleet id, or "automatic" for the nearest fleet (default: [fleet] selection)
    #[arg(long)]
    pub fleet: Option<String>,
}

pub async fn run(args: ResolveArgs, config: &CoreConfig) -> Result<(), CliError> {
    let fleets_file = args.source.fleets_file(config)?;
    let location = args.source.location();
    let selection = match &args.fleet {
        Some(fleet) => fleet.parse::<FleetSelection>().unwrap_or_default(),
        None => config.fleet.selection.clone(),
    };

    let resolver = FleetResolver::with_config(
        Arc::new(JsonFleetDirectory::new(&fleets_file)),
        Arc::new(FixedLocation::new(location)),
        Arc::new(HaversineDistance),
        config.fleet_resolver_config(),
    );

    let resolved = resolver
        .resolve_fleet(stream::iter([selection.clone()]))
        .next()
        .await;
    resolver.shut_down();

    let fleet = resolved.ok_or(CliError::NothingResolved { fleets_file })?;

    println!("Selection: {}", selection);
    println!("Fleet:     {}", fleet.id);
    println!("Name:      {}", fleet.name);
    match fleet.center {
        Some(center) => println!(
            "Distance:  {}",
            format_distance(haversine_meters(location, center))
        ),
        None => println!("Distance:  (fleet has no center)"),
    }
    if resolver.config().is_default_fleet(&fleet) {
        println!("Note:      fallback fleet, nothing nearer could be resolved");
    }
    if fleet.is_phantom {
        println!("Note:      phantom fleet, no real vehicles");
    }
    Ok(())
}
