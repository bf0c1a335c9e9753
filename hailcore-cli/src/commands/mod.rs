//! CLI subcommands.

pub mod camera_demo;
mod common;
pub mod fleets;
pub mod resolve;
