//! HailCore - reactive core of a ride-hailing client
//!
//! The library holds the platform-independent state machines a passenger or
//! driver app builds its screens on:
//!
//! - [`retry`]: bounded retry policy for fallible operations and streams
//! - [`progress`]: loading state of a single tracked async operation
//! - [`camera`]: relay between per-screen map state and the map renderer
//! - [`fleet`]: resolves the operating fleet from the user's selection
//!
//! Supporting modules provide geographic math ([`geo`]), the small reactive
//! toolkit the state machines are built on ([`reactive`]), configuration
//! ([`config`]), logging setup ([`logging`]) and stock collaborators
//! ([`directory`]).

pub mod camera;
pub mod config;
pub mod directory;
pub mod fleet;
pub mod geo;
pub mod logging;
pub mod progress;
pub mod reactive;
pub mod retry;
