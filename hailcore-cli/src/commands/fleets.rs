//! `hailcore fleets`: list fleets nearest first.

use clap::Args;
use hailcore::config::CoreConfig;
use hailcore::directory::JsonFleetDirectory;
use hailcore::fleet::{rank_fleets, FleetTier};
use hailcore::geo::HaversineDistance;

use super::common::{format_distance, FleetSource};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct FleetsArgs {
    #[command(flatten)]
    pub source: FleetSource,
}

pub async fn run(args: FleetsArgs, config: &CoreConfig) -> Result<(), CliError> {
    let fleets_file = args.source.fleets_file(config)?;
    let fleets = JsonFleetDirectory::new(&fleets_file).load().await?;
    let ranked = rank_fleets(&fleets, args.source.location(), &HaversineDistance);

    println!("{} fleet(s) in {}", fleets.len(), fleets_file.display());
    println!();
    println!("  {:<20} {:<24} {:>10}  TIER", "ID", "NAME", "DISTANCE");
    for entry in &ranked {
        let tier = match entry.tier {
            FleetTier::Real => "real",
            FleetTier::Phantom => "phantom",
        };
        println!(
            "  {:<20} {:<24} {:>10}  {}",
            entry.fleet.id,
            entry.fleet.name,
            format_distance(entry.distance_meters),
            tier
        );
    }

    let unlocatable: Vec<_> = fleets.iter().filter(|f| !f.is_locatable()).collect();
    if !unlocatable.is_empty() {
        println!();
        println!("Manual selection only (no center):");
        for fleet in unlocatable {
            println!("  {}", fleet);
        }
    }
    Ok(())
}
