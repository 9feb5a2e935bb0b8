//! High-level drone commands and safety validation.
//!
//! A [`DroneCommand`] is validated when it is built (or deserialized), so
//! any command that exists has parameters inside the allowed ranges.
//! [`CommandValidator`] adds checks that depend on context: per-command
//! safety and whole-sequence linting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// Minimum distance for a single move command (cm).
pub const MIN_MOVE_CM: i64 = 20;
/// Maximum distance for a single move command (cm).
pub const MAX_MOVE_CM: i64 = 500;
/// Moves longer than this fail the per-command safety check (cm).
pub const MAX_SAFE_MOVE_CM: i64 = 300;
/// Total distance a sequence may cover before it is flagged (cm).
pub const MAX_SEQUENCE_DISTANCE_CM: i64 = 1000;

const DEFAULT_MOVE_CM: i64 = 100;
const DEFAULT_ANGLE_DEG: i64 = 90;
const DEFAULT_SCAN_SECS: i64 = 5;
const DEFAULT_HOVER_SECS: i64 = 3;

/// Available drone actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneAction {
    Takeoff,
    Land,
    Move,
    Rotate,
    Hover,
    Scan,
    Emergency,
}

impl DroneAction {
    /// Actions that require the drone to be airborne.
    pub fn is_movement(self) -> bool {
        matches!(self, DroneAction::Move | DroneAction::Rotate | DroneAction::Scan)
    }
}

/// Direction of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    pub const ALL: [MoveDirection; 6] = [
        MoveDirection::Forward,
        MoveDirection::Back,
        MoveDirection::Left,
        MoveDirection::Right,
        MoveDirection::Up,
        MoveDirection::Down,
    ];

    /// Verb used on the Tello wire protocol.
    pub fn as_str(self) -> &'static str {
        match self {
            MoveDirection::Forward => "forward",
            MoveDirection::Back => "back",
            MoveDirection::Left => "left",
            MoveDirection::Right => "right",
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveDirection {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveDirection::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| CommandError::InvalidDirection(s.to_string()))
    }
}

/// Parameters attached to a command. Unused fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// A validated drone command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDroneCommand")]
pub struct DroneCommand {
    pub action: DroneAction,
    pub parameters: CommandParameters,
    pub description: String,
    pub safety_check: bool,
}

#[derive(Deserialize)]
struct RawDroneCommand {
    action: DroneAction,
    #[serde(default)]
    parameters: CommandParameters,
    #[serde(default)]
    description: String,
    #[serde(default = "default_safety_check")]
    safety_check: bool,
}

fn default_safety_check() -> bool {
    true
}

impl TryFrom<RawDroneCommand> for DroneCommand {
    type Error = CommandError;

    fn try_from(raw: RawDroneCommand) -> Result<Self, Self::Error> {
        DroneCommand::new(raw.action, raw.parameters, raw.description, raw.safety_check)
    }
}

impl DroneCommand {
    /// Build a command, filling defaults and validating parameters.
    pub fn new(
        action: DroneAction,
        parameters: CommandParameters,
        description: impl Into<String>,
        safety_check: bool,
    ) -> Result<Self, CommandError> {
        let mut command = Self {
            action,
            parameters,
            description: description.into(),
            safety_check,
        };
        command.validate()?;
        Ok(command)
    }

    /// A parameterless command with safety checks enabled.
    pub fn simple(action: DroneAction) -> Result<Self, CommandError> {
        Self::new(action, CommandParameters::default(), "", true)
    }

    pub fn takeoff() -> Self {
        Self::unchecked(DroneAction::Takeoff)
    }

    pub fn land() -> Self {
        Self::unchecked(DroneAction::Land)
    }

    pub fn emergency() -> Self {
        Self::unchecked(DroneAction::Emergency)
    }

    pub fn move_by(direction: MoveDirection, distance_cm: i64) -> Result<Self, CommandError> {
        let parameters = CommandParameters {
            direction: Some(direction.as_str().to_string()),
            distance: Some(distance_cm),
            ..Default::default()
        };
        Self::new(
            DroneAction::Move,
            parameters,
            format!("Move {} {}cm", direction, distance_cm),
            true,
        )
    }

    /// Positive angles rotate clockwise.
    pub fn rotate(angle_deg: i64) -> Result<Self, CommandError> {
        let parameters = CommandParameters {
            angle: Some(angle_deg),
            ..Default::default()
        };
        Self::new(DroneAction::Rotate, parameters, format!("Rotate {}°", angle_deg), true)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_safety_check(mut self, safety_check: bool) -> Self {
        self.safety_check = safety_check;
        self
    }

    // Parameterless actions cannot fail validation.
    fn unchecked(action: DroneAction) -> Self {
        Self {
            action,
            parameters: CommandParameters::default(),
            description: String::new(),
            safety_check: true,
        }
    }

    fn validate(&mut self) -> Result<(), CommandError> {
        match self.action {
            DroneAction::Move => self.validate_move(),
            DroneAction::Rotate => self.validate_rotate(),
            DroneAction::Scan => self.validate_scan(),
            DroneAction::Hover => {
                self.parameters.duration.get_or_insert(DEFAULT_HOVER_SECS);
                Ok(())
            }
            DroneAction::Takeoff | DroneAction::Land | DroneAction::Emergency => Ok(()),
        }
    }

    fn validate_move(&mut self) -> Result<(), CommandError> {
        let direction = self.parameters.direction.as_deref().unwrap_or("None");
        direction.parse::<MoveDirection>()?;

        let distance = *self.parameters.distance.get_or_insert(DEFAULT_MOVE_CM);
        if !(MIN_MOVE_CM..=MAX_MOVE_CM).contains(&distance) {
            return Err(CommandError::DistanceOutOfRange {
                value: distance,
                min: MIN_MOVE_CM,
                max: MAX_MOVE_CM,
            });
        }
        Ok(())
    }

    fn validate_rotate(&mut self) -> Result<(), CommandError> {
        let angle = *self.parameters.angle.get_or_insert(DEFAULT_ANGLE_DEG);
        if !(-360..=360).contains(&angle) {
            return Err(CommandError::AngleOutOfRange {
                value: angle,
                min: -360,
                max: 360,
            });
        }
        Ok(())
    }

    fn validate_scan(&mut self) -> Result<(), CommandError> {
        let duration = *self.parameters.duration.get_or_insert(DEFAULT_SCAN_SECS);
        if !(1..=30).contains(&duration) {
            return Err(CommandError::ScanDurationOutOfRange(duration));
        }
        Ok(())
    }

    /// Direction of a move command.
    pub fn direction(&self) -> Option<MoveDirection> {
        self.parameters.direction.as_deref()?.parse().ok()
    }

    /// Distance of a move command in cm (0 for other actions).
    pub fn distance_cm(&self) -> i64 {
        match self.action {
            DroneAction::Move => self.parameters.distance.unwrap_or(0),
            _ => 0,
        }
    }
}

/// Validates commands and command sequences for safety.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandValidator;

impl CommandValidator {
    /// Check whether a single command may be executed.
    pub fn is_safe_command(command: &DroneCommand) -> bool {
        if !command.safety_check && command.action != DroneAction::Emergency {
            return false;
        }
        if command.action == DroneAction::Move && command.distance_cm() > MAX_SAFE_MOVE_CM {
            return false;
        }
        true
    }

    /// Lint a command sequence, returning one warning per problem found.
    pub fn validate_command_sequence(commands: &[DroneCommand]) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut has_takeoff = false;
        for (i, command) in commands.iter().enumerate() {
            if command.action == DroneAction::Takeoff {
                has_takeoff = true;
            } else if command.action.is_movement() && !has_takeoff {
                warnings.push(format!("Command {}: Movement command without takeoff", i + 1));
            }
        }

        let total_distance: i64 = commands.iter().map(DroneCommand::distance_cm).sum();
        if total_distance > MAX_SEQUENCE_DISTANCE_CM {
            warnings.push(format!(
                "Total movement distance ({}cm) exceeds safe limit",
                total_distance
            ));
        }

        if let Some(last) = commands.last() {
            if last.action != DroneAction::Land {
                warnings.push("Command sequence should end with landing".to_string());
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_params(direction: &str, distance: i64) -> CommandParameters {
        CommandParameters {
            direction: Some(direction.to_string()),
            distance: Some(distance),
            ..Default::default()
        }
    }

    #[test]
    fn test_takeoff_command() {
        let cmd = DroneCommand::new(
            DroneAction::Takeoff,
            CommandParameters::default(),
            "Taking off",
            true,
        )
        .unwrap();
        assert_eq!(cmd.action, DroneAction::Takeoff);
        assert!(cmd.safety_check);
        assert_eq!(cmd.description, "Taking off");
    }

    #[test]
    fn test_move_command_validation() {
        let cmd = DroneCommand::new(
            DroneAction::Move,
            move_params("forward", 100),
            "Move forward",
            true,
        )
        .unwrap();
        assert_eq!(cmd.direction(), Some(MoveDirection::Forward));
        assert_eq!(cmd.distance_cm(), 100);

        let err = DroneCommand::new(DroneAction::Move, move_params("invalid", 100), "", true)
            .unwrap_err();
        assert_eq!(err, CommandError::InvalidDirection("invalid".into()));

        let err = DroneCommand::new(DroneAction::Move, move_params("forward", 1000), "", true)
            .unwrap_err();
        assert!(matches!(err, CommandError::DistanceOutOfRange { value: 1000, .. }));
    }

    #[test]
    fn test_move_distance_bounds_are_inclusive() {
        assert!(DroneCommand::move_by(MoveDirection::Up, 20).is_ok());
        assert!(DroneCommand::move_by(MoveDirection::Up, 500).is_ok());
        assert!(DroneCommand::move_by(MoveDirection::Up, 19).is_err());
        assert!(DroneCommand::move_by(MoveDirection::Up, 501).is_err());
    }

    #[test]
    fn test_move_without_direction_is_rejected() {
        let err = DroneCommand::simple(DroneAction::Move).unwrap_err();
        assert_eq!(err, CommandError::InvalidDirection("None".into()));
    }

    #[test]
    fn test_rotate_command_validation() {
        let cmd = DroneCommand::rotate(90).unwrap();
        assert_eq!(cmd.parameters.angle, Some(90));
        assert!(DroneCommand::rotate(-360).is_ok());
        assert!(DroneCommand::rotate(400).is_err());

        let defaulted = DroneCommand::simple(DroneAction::Rotate).unwrap();
        assert_eq!(defaulted.parameters.angle, Some(90));
    }

    #[test]
    fn test_scan_duration_defaults_and_bounds() {
        let scan = DroneCommand::simple(DroneAction::Scan).unwrap();
        assert_eq!(scan.parameters.duration, Some(5));

        let params = CommandParameters {
            duration: Some(31),
            ..Default::default()
        };
        assert_eq!(
            DroneCommand::new(DroneAction::Scan, params, "", true).unwrap_err(),
            CommandError::ScanDurationOutOfRange(31)
        );
    }

    #[test]
    fn test_command_serialization() {
        let original = DroneCommand::new(
            DroneAction::Move,
            move_params("forward", 200),
            "Move forward 2m",
            true,
        )
        .unwrap();

        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["action"], "move");
        assert_eq!(json["parameters"]["distance"], 200);

        let restored: DroneCommand = serde_json::from_value(json).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_deserialization_revalidates() {
        let json = r#"{"action": "move", "parameters": {"direction": "sideways", "distance": 50}}"#;
        assert!(serde_json::from_str::<DroneCommand>(json).is_err());

        let json = r#"{"action": "land"}"#;
        let cmd: DroneCommand = serde_json::from_str(json).unwrap();
        assert!(cmd.safety_check);
        assert!(cmd.description.is_empty());
    }

    #[test]
    fn test_safe_command_validation() {
        assert!(CommandValidator::is_safe_command(&DroneCommand::takeoff()));

        let unsafe_move = DroneCommand::move_by(MoveDirection::Forward, 100)
            .unwrap()
            .with_safety_check(false);
        assert!(!CommandValidator::is_safe_command(&unsafe_move));

        let emergency = DroneCommand::emergency().with_safety_check(false);
        assert!(CommandValidator::is_safe_command(&emergency));

        let long_move = DroneCommand::move_by(MoveDirection::Forward, 400).unwrap();
        assert!(!CommandValidator::is_safe_command(&long_move));
    }

    #[test]
    fn test_command_sequence_validation() {
        let commands = vec![
            DroneCommand::takeoff(),
            DroneCommand::move_by(MoveDirection::Forward, 100).unwrap(),
            DroneCommand::land(),
        ];
        assert!(CommandValidator::validate_command_sequence(&commands).is_empty());

        let invalid = vec![
            DroneCommand::move_by(MoveDirection::Forward, 100).unwrap(),
            DroneCommand::land(),
        ];
        let warnings = CommandValidator::validate_command_sequence(&invalid);
        assert_eq!(warnings, vec!["Command 1: Movement command without takeoff".to_string()]);
    }

    #[test]
    fn test_sequence_must_end_with_landing() {
        let commands = vec![DroneCommand::takeoff(), DroneCommand::rotate(90).unwrap()];
        let warnings = CommandValidator::validate_command_sequence(&commands);
        assert_eq!(warnings, vec!["Command sequence should end with landing".to_string()]);
    }

    #[test]
    fn test_sequence_total_distance_limit() {
        let mut commands = vec![DroneCommand::takeoff()];
        for _ in 0..3 {
            commands.push(DroneCommand::move_by(MoveDirection::Forward, 400).unwrap());
        }
        commands.push(DroneCommand::land());

        let warnings = CommandValidator::validate_command_sequence(&commands);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("1200cm"));
    }

    #[test]
    fn test_empty_sequence_has_no_warnings() {
        assert!(CommandValidator::validate_command_sequence(&[]).is_empty());
    }
}
