//! Map camera arbitration.
//!
//! Several screens want to drive the camera (follow the device, frame a
//! route) without yanking control away from a user who is panning the map.
//! The [`CameraRelay`] centralizes that rule:
//!
//! ```text
//! Screen ──► MapStateProvider ──► CameraRelay ──► renderer
//!                                   ▲
//!              drag / re-center ────┘
//! ```
//!
//! - A new relay starts without authority, so attaching never jumps the
//!   camera. The first re-center grants it.
//! - A drag hands authority to the user; non-forced commands are held back.
//! - Re-centering hands authority back and re-applies the latest command.
//! - Forced commands always go through.

mod provider;
mod relay;
mod types;

pub use provider::{
    IgnoreCentering, MapCenterListener, MapStateProvider, RecordingCenterListener, ScreenMapState,
};
pub use relay::CameraRelay;
pub use types::{
    CameraCommand, CameraRequest, MapPadding, MapPath, MapSettings, Marker, MarkerKind, MarkerMap,
};
