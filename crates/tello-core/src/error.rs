//! Error types shared by command validation and the restriction layer.

use thiserror::Error;

/// A command failed parameter validation before reaching the drone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
    #[error("Distance must be between {min}-{max}cm: {value}")]
    DistanceOutOfRange { value: i64, min: i64, max: i64 },
    #[error("Angle must be between {min} and {max} degrees: {value}")]
    AngleOutOfRange { value: i64, min: i64, max: i64 },
    #[error("Scan duration must be between 1-30 seconds: {0}")]
    ScanDurationOutOfRange(i64),
    #[error("Speed must be between {min} and {max} cm/s: {value}")]
    SpeedOutOfRange { value: i64, min: i64, max: i64 },
    #[error("Coordinate must be between -500 and 500 cm: {0}")]
    CoordinateOutOfRange(i64),
    #[error("Flip direction must be one of: f, b, l, r (got {0})")]
    InvalidFlip(String),
    #[error("Parameter '{name}' must be an integer")]
    InvalidParameter { name: String },
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// A command was refused by the restriction manager.
///
/// The display strings are the replies operators see in place of a drone
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestrictionError {
    #[error("error: command not allowed")]
    CommandNotAllowed,
    #[error("error: command rate limit exceeded")]
    RateLimitExceeded,
    #[error("error: speed exceeds maximum limit")]
    SpeedExceeded,
    #[error("error: distance exceeds maximum limit")]
    DistanceExceeded,
    #[error("error: emergency stop not allowed")]
    EmergencyNotAllowed,
}

/// A restrictions file could not be loaded.
#[derive(Debug, Error)]
pub enum RestrictionFileError {
    #[error("reading restrictions from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing restrictions in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}
