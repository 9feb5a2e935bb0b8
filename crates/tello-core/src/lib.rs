pub mod commands;
pub mod error;
pub mod models;
pub mod restrictions;
pub mod telemetry;
pub mod wire;

pub use commands::{CommandValidator, DroneAction, DroneCommand, MoveDirection};
pub use error::{CommandError, RestrictionError, RestrictionFileError};
pub use models::{FlightMode, FlightState, SharedFlightState};
pub use restrictions::{FlightArea, RestrictionManager, Restrictions, RestrictionsUpdate};
pub use telemetry::TelloTelemetry;
pub use wire::{FlipDirection, Rotation, TelloCommand, TelloResponse};
