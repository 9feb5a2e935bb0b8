//! Tello SDK - drone integration library
//!
//! Speaks the Tello UDP text protocol, enforces flight restrictions on
//! outgoing commands, and offers a simulated drone for vision-only runs.

pub mod client;
pub mod error;
pub mod link;
pub mod restricted;
pub mod simulated;
pub mod state_stream;
pub mod video;

pub use client::{TelloClient, TelloConfig};
pub use error::{Result, SdkError};
pub use link::DroneLink;
pub use restricted::RestrictedTello;
pub use simulated::SimulatedTello;
pub use tello_core::{TelloCommand, TelloResponse};
