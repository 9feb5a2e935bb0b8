//! Realtime speech API plumbing for the drone agent.
//!
//! `protocol` holds the JSON event types, `client` owns the WebSocket,
//! and `bridge` decides what to send in reaction to server events while
//! keeping at most one response generation in flight.

pub mod bridge;
pub mod client;
pub mod error;
pub mod gate;
pub mod protocol;

pub use bridge::{BridgeAction, SpeechBridge};
pub use client::{realtime_url, RealtimeClient, RealtimeReceiver, RealtimeSender};
pub use error::{RealtimeError, Result};
pub use gate::{GateState, Release, ResponseGate};
pub use protocol::{ClientEvent, ServerEvent, SessionConfig, ToolDefinition};
