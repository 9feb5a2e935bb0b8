//! Core data models for the drone agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Flight state shared between the voice session and the drone handlers.
pub type SharedFlightState = Arc<Mutex<FlightState>>;

/// Whether commands reach real hardware or a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightMode {
    /// Mocked drone and camera responses
    #[default]
    VisionOnly,
    /// Commands are sent over UDP to a Tello
    RealDrone,
}

impl FlightMode {
    pub fn from_flags(real_drone: bool) -> Self {
        if real_drone {
            FlightMode::RealDrone
        } else {
            FlightMode::VisionOnly
        }
    }

    pub fn is_simulated(self) -> bool {
        self == FlightMode::VisionOnly
    }

    pub fn label(self) -> &'static str {
        match self {
            FlightMode::VisionOnly => "VISION_ONLY",
            FlightMode::RealDrone => "REAL_DRONE",
        }
    }
}

/// Current flight state and history of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    pub is_flying: bool,
    /// Battery percentage (0-100)
    pub battery: u8,
    /// Height above takeoff point in centimeters
    pub height_cm: u32,
    pub movement_count: u32,
    #[serde(default)]
    pub last_image_analysis: String,
    #[serde(default)]
    pub obstacles_detected: Vec<String>,
    pub last_update: DateTime<Utc>,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            is_flying: false,
            battery: 100,
            height_cm: 0,
            movement_count: 0,
            last_image_analysis: String::new(),
            obstacles_detected: Vec::new(),
            last_update: Utc::now(),
        }
    }
}

impl FlightState {
    pub fn shared() -> SharedFlightState {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Record a successful takeoff.
    pub fn mark_airborne(&mut self, height_cm: u32) {
        self.is_flying = true;
        self.height_cm = height_cm;
        self.touch();
    }

    /// Record a landing (or an emergency motor stop).
    pub fn mark_landed(&mut self) {
        self.is_flying = false;
        self.height_cm = 0;
        self.touch();
    }

    /// Count a movement and return the new total.
    pub fn record_movement(&mut self) -> u32 {
        self.movement_count += 1;
        self.touch();
        self.movement_count
    }

    pub fn climb(&mut self, cm: u32) {
        self.height_cm = self.height_cm.saturating_add(cm);
        self.touch();
    }

    pub fn descend(&mut self, cm: u32) {
        self.height_cm = self.height_cm.saturating_sub(cm);
        self.touch();
    }

    /// Update battery from a drone reading; negative or failed readings are ignored.
    pub fn set_battery(&mut self, reading: i64) {
        if reading >= 0 {
            self.battery = reading.min(100) as u8;
            self.touch();
        }
    }

    /// Update height from a drone reading; negative or failed readings are ignored.
    pub fn set_height(&mut self, reading: i64) {
        if reading >= 0 {
            self.height_cm = reading.min(u32::MAX as i64) as u32;
            self.touch();
        }
    }

    pub fn record_analysis(&mut self, analysis: impl Into<String>, obstacles: Vec<String>) {
        self.last_image_analysis = analysis.into();
        self.obstacles_detected = obstacles;
        self.touch();
    }

    /// One-line summary spoken back to the operator.
    pub fn status_line(&self) -> String {
        format!(
            "Drone Status: Flying={}, Battery={}%, Height={}cm, Movements={}",
            if self.is_flying { "True" } else { "False" },
            self.battery,
            self.height_cm,
            self.movement_count
        )
    }

    fn touch(&mut self) {
        self.last_update = Utc::now();
    }
}
