//! Flight restrictions applied to outgoing Tello commands.
//!
//! Organisers can limit which verbs are accepted, how many commands per
//! second go out, and how large speed/distance parameters may be. Checks
//! are made on the raw command text right before it is sent.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{RestrictionError, RestrictionFileError};

const RATE_WINDOW: Duration = Duration::from_secs(1);

const MOVEMENT_VERBS: [&str; 6] = ["forward", "back", "left", "right", "up", "down"];

fn default_allowed_commands() -> Vec<String> {
    [
        "takeoff", "land", "forward", "back", "left", "right", "up", "down", "ccw", "cw", "flip",
        "speed", "battery?", "height?", "speed?", "temp?", "wifi?", "time?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Box the drone must stay in, relative to takeoff (cm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightArea {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
    pub z_min: i32,
    pub z_max: i32,
}

impl Default for FlightArea {
    fn default() -> Self {
        Self {
            x_min: -100,
            x_max: 100,
            y_min: -100,
            y_max: 100,
            z_min: 0,
            z_max: 50,
        }
    }
}

impl FlightArea {
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x)
            && (self.y_min..=self.y_max).contains(&y)
            && (self.z_min..=self.z_max).contains(&z)
    }
}

/// Restriction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restrictions {
    /// Maximum `speed` parameter (cm/s)
    pub max_speed: u32,
    /// Maximum distance of a single move (cm)
    pub max_distance: u32,
    pub command_limit_per_second: u32,
    /// Command verbs that may be sent
    pub allowed_commands: Vec<String>,
    pub emergency_stop_allowed: bool,
    /// Maximum flight time in seconds
    pub max_flight_time: u32,
    pub allowed_flight_area: FlightArea,
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            max_speed: 100,
            max_distance: 500,
            command_limit_per_second: 10,
            allowed_commands: default_allowed_commands(),
            emergency_stop_allowed: false,
            max_flight_time: 30,
            allowed_flight_area: FlightArea::default(),
        }
    }
}

/// Partial restriction update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionsUpdate {
    pub max_speed: Option<u32>,
    pub max_distance: Option<u32>,
    pub command_limit_per_second: Option<u32>,
    pub allowed_commands: Option<Vec<String>>,
    pub emergency_stop_allowed: Option<bool>,
    pub max_flight_time: Option<u32>,
    pub allowed_flight_area: Option<FlightArea>,
}

impl RestrictionsUpdate {
    /// Load a partial restriction set from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, RestrictionFileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RestrictionFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RestrictionFileError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Restrictions {
    /// Every SDK verb allowed, emergency stop included. Rate and range
    /// limits keep their defaults.
    pub fn full_access() -> Self {
        let mut allowed = default_allowed_commands();
        allowed.extend(
            ["emergency", "stop", "go", "curve", "streamon", "streamoff"]
                .into_iter()
                .map(String::from),
        );
        Self {
            allowed_commands: allowed,
            emergency_stop_allowed: true,
            ..Default::default()
        }
    }

    pub fn apply(&mut self, update: RestrictionsUpdate) {
        if let Some(v) = update.max_speed {
            self.max_speed = v;
        }
        if let Some(v) = update.max_distance {
            self.max_distance = v;
        }
        if let Some(v) = update.command_limit_per_second {
            self.command_limit_per_second = v;
        }
        if let Some(v) = update.allowed_commands {
            self.allowed_commands = v;
        }
        if let Some(v) = update.emergency_stop_allowed {
            self.emergency_stop_allowed = v;
        }
        if let Some(v) = update.max_flight_time {
            self.max_flight_time = v;
        }
        if let Some(v) = update.allowed_flight_area {
            self.allowed_flight_area = v;
        }
    }
}

/// Validates outgoing commands against [`Restrictions`].
#[derive(Debug, Clone)]
pub struct RestrictionManager {
    restrictions: Restrictions,
    command_count: u32,
    window_start: Instant,
}

impl Default for RestrictionManager {
    fn default() -> Self {
        Self::new(Restrictions::default())
    }
}

impl RestrictionManager {
    pub fn new(restrictions: Restrictions) -> Self {
        Self {
            restrictions,
            command_count: 0,
            window_start: Instant::now(),
        }
    }

    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    pub fn update(&mut self, update: RestrictionsUpdate) {
        self.restrictions.apply(update);
    }

    /// Whether the command's verb is on the allow-list.
    ///
    /// `command` (entering SDK mode) is always allowed.
    pub fn is_command_allowed(&self, command: &str) -> bool {
        let verb = command.split_whitespace().next().unwrap_or_default();
        verb == "command" || self.restrictions.allowed_commands.iter().any(|c| c == verb)
    }

    pub fn check_speed_limit(&self, speed: i64) -> bool {
        speed <= self.restrictions.max_speed as i64
    }

    pub fn check_distance_limit(&self, distance: i64) -> bool {
        distance <= self.restrictions.max_distance as i64
    }

    /// Count a command against the per-second budget.
    ///
    /// Returns false once the budget for the current one-second window is
    /// spent; rejected commands do not consume budget.
    pub fn check_command_rate(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start) > RATE_WINDOW {
            self.command_count = 0;
            self.window_start = now;
        }
        if self.command_count >= self.restrictions.command_limit_per_second {
            return false;
        }
        self.command_count += 1;
        true
    }

    pub fn emergency_allowed(&self) -> bool {
        self.restrictions.emergency_stop_allowed
    }

    /// Run every check for an outgoing command.
    pub fn check(&mut self, command: &str) -> Result<(), RestrictionError> {
        self.check_at(command, Instant::now())
    }

    pub fn check_at(&mut self, command: &str, now: Instant) -> Result<(), RestrictionError> {
        if !self.is_command_allowed(command) {
            return Err(RestrictionError::CommandNotAllowed);
        }
        if !self.check_command_rate(now) {
            return Err(RestrictionError::RateLimitExceeded);
        }

        let mut parts = command.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        // Unparsable parameters are left for the drone to reject.
        let argument = parts.next().and_then(|p| p.parse::<i64>().ok());

        match (verb, argument) {
            ("speed", Some(speed)) if !self.check_speed_limit(speed) => {
                Err(RestrictionError::SpeedExceeded)
            }
            (verb, Some(distance))
                if MOVEMENT_VERBS.contains(&verb) && !self.check_distance_limit(distance) =>
            {
                Err(RestrictionError::DistanceExceeded)
            }
            _ => Ok(()),
        }
    }
}
