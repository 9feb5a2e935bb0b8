//! Tello voice agent.
//!
//! Connects a realtime speech session to drone handlers: the model calls
//! tools, the controller flies (or simulates) and its replies are spoken
//! back.

pub mod audio;
pub mod config;
pub mod controller;
pub mod session;
pub mod tools;

pub use config::{Config, ConfigError};
pub use controller::DroneController;
pub use session::VoiceSession;
