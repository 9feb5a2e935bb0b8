//! Text commands and replies of the stock Tello SDK (UDP port 8889).

use std::fmt;

use crate::commands::MoveDirection;
use crate::error::CommandError;

/// Move range accepted by the SDK (cm).
pub const MOVE_RANGE_CM: (i64, i64) = (20, 500);
/// Rotation range accepted by the SDK (degrees).
pub const ROTATE_RANGE_DEG: (i64, i64) = (1, 360);
/// Speed range for `speed` and `go` (cm/s).
pub const SPEED_RANGE_CMS: (i64, i64) = (10, 100);
/// Speed range for `curve` (cm/s).
pub const CURVE_SPEED_RANGE_CMS: (i64, i64) = (10, 60);
/// Coordinate range for `go` and `curve` (cm).
pub const COORD_RANGE_CM: (i64, i64) = (-500, 500);

/// Rotation sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::Clockwise => "cw",
            Rotation::CounterClockwise => "ccw",
        }
    }
}

/// Flip direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Forward,
    Back,
    Left,
    Right,
}

impl FlipDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            FlipDirection::Forward => "f",
            FlipDirection::Back => "b",
            FlipDirection::Left => "l",
            FlipDirection::Right => "r",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CommandError> {
        match s {
            "f" => Ok(FlipDirection::Forward),
            "b" => Ok(FlipDirection::Back),
            "l" => Ok(FlipDirection::Left),
            "r" => Ok(FlipDirection::Right),
            other => Err(CommandError::InvalidFlip(other.to_string())),
        }
    }
}

/// A command in the Tello text protocol.
///
/// Construct parameterised variants through the `new_*` helpers so values
/// are range-checked before they reach the drone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelloCommand {
    /// Enter SDK mode
    Command,
    Takeoff,
    Land,
    /// Stop all motors immediately
    Emergency,
    /// Hover in place
    Stop,
    StreamOn,
    StreamOff,
    Move(MoveDirection, u32),
    Rotate(Rotation, u32),
    Flip(FlipDirection),
    Go { x: i32, y: i32, z: i32, speed: u32 },
    Curve { x1: i32, y1: i32, z1: i32, x2: i32, y2: i32, z2: i32, speed: u32 },
    SetSpeed(u32),
    Battery,
    Height,
    Speed,
    Temperature,
    Wifi,
    FlightTime,
}

fn check_range(value: i64, (min, max): (i64, i64)) -> bool {
    (min..=max).contains(&value)
}

fn check_coord(value: i64) -> Result<i32, CommandError> {
    if check_range(value, COORD_RANGE_CM) {
        Ok(value as i32)
    } else {
        Err(CommandError::CoordinateOutOfRange(value))
    }
}

impl TelloCommand {
    pub fn new_move(direction: MoveDirection, distance_cm: i64) -> Result<Self, CommandError> {
        if !check_range(distance_cm, MOVE_RANGE_CM) {
            return Err(CommandError::DistanceOutOfRange {
                value: distance_cm,
                min: MOVE_RANGE_CM.0,
                max: MOVE_RANGE_CM.1,
            });
        }
        Ok(TelloCommand::Move(direction, distance_cm as u32))
    }

    pub fn new_rotate(rotation: Rotation, degrees: i64) -> Result<Self, CommandError> {
        if !check_range(degrees, ROTATE_RANGE_DEG) {
            return Err(CommandError::AngleOutOfRange {
                value: degrees,
                min: ROTATE_RANGE_DEG.0,
                max: ROTATE_RANGE_DEG.1,
            });
        }
        Ok(TelloCommand::Rotate(rotation, degrees as u32))
    }

    pub fn new_speed(speed: i64) -> Result<Self, CommandError> {
        if !check_range(speed, SPEED_RANGE_CMS) {
            return Err(CommandError::SpeedOutOfRange {
                value: speed,
                min: SPEED_RANGE_CMS.0,
                max: SPEED_RANGE_CMS.1,
            });
        }
        Ok(TelloCommand::SetSpeed(speed as u32))
    }

    pub fn new_go(x: i64, y: i64, z: i64, speed: i64) -> Result<Self, CommandError> {
        if !check_range(speed, SPEED_RANGE_CMS) {
            return Err(CommandError::SpeedOutOfRange {
                value: speed,
                min: SPEED_RANGE_CMS.0,
                max: SPEED_RANGE_CMS.1,
            });
        }
        Ok(TelloCommand::Go {
            x: check_coord(x)?,
            y: check_coord(y)?,
            z: check_coord(z)?,
            speed: speed as u32,
        })
    }

    pub fn new_curve(
        (x1, y1, z1): (i64, i64, i64),
        (x2, y2, z2): (i64, i64, i64),
        speed: i64,
    ) -> Result<Self, CommandError> {
        if !check_range(speed, CURVE_SPEED_RANGE_CMS) {
            return Err(CommandError::SpeedOutOfRange {
                value: speed,
                min: CURVE_SPEED_RANGE_CMS.0,
                max: CURVE_SPEED_RANGE_CMS.1,
            });
        }
        Ok(TelloCommand::Curve {
            x1: check_coord(x1)?,
            y1: check_coord(y1)?,
            z1: check_coord(z1)?,
            x2: check_coord(x2)?,
            y2: check_coord(y2)?,
            z2: check_coord(z2)?,
            speed: speed as u32,
        })
    }

    /// Exact text sent in the UDP datagram.
    pub fn to_wire(&self) -> String {
        match self {
            TelloCommand::Command => "command".into(),
            TelloCommand::Takeoff => "takeoff".into(),
            TelloCommand::Land => "land".into(),
            TelloCommand::Emergency => "emergency".into(),
            TelloCommand::Stop => "stop".into(),
            TelloCommand::StreamOn => "streamon".into(),
            TelloCommand::StreamOff => "streamoff".into(),
            TelloCommand::Move(direction, cm) => format!("{} {}", direction.as_str(), cm),
            TelloCommand::Rotate(rotation, deg) => format!("{} {}", rotation.as_str(), deg),
            TelloCommand::Flip(direction) => format!("flip {}", direction.as_str()),
            TelloCommand::Go { x, y, z, speed } => format!("go {} {} {} {}", x, y, z, speed),
            TelloCommand::Curve { x1, y1, z1, x2, y2, z2, speed } => {
                format!("curve {} {} {} {} {} {} {}", x1, y1, z1, x2, y2, z2, speed)
            }
            TelloCommand::SetSpeed(speed) => format!("speed {}", speed),
            TelloCommand::Battery => "battery?".into(),
            TelloCommand::Height => "height?".into(),
            TelloCommand::Speed => "speed?".into(),
            TelloCommand::Temperature => "temp?".into(),
            TelloCommand::Wifi => "wifi?".into(),
            TelloCommand::FlightTime => "time?".into(),
        }
    }

    /// Whether the drone answers with a value rather than `ok`.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            TelloCommand::Battery
                | TelloCommand::Height
                | TelloCommand::Speed
                | TelloCommand::Temperature
                | TelloCommand::Wifi
                | TelloCommand::FlightTime
        )
    }
}

impl fmt::Display for TelloCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// A reply datagram from the drone.
#[derive(Debug, Clone, PartialEq)]
pub enum TelloResponse {
    Ok,
    Error(String),
    Value(i64),
    Text(String),
}

impl TelloResponse {
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim().trim_end_matches('\0').trim();
        if text.eq_ignore_ascii_case("ok") {
            return TelloResponse::Ok;
        }
        if text.to_ascii_lowercase().starts_with("error") {
            return TelloResponse::Error(text.to_string());
        }
        match parse_leading_int(text) {
            Some(value) => TelloResponse::Value(value),
            None => TelloResponse::Text(text.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, TelloResponse::Ok)
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            TelloResponse::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Parse replies such as `87`, `30dm`, `12s`.
fn parse_leading_int(text: &str) -> Option<i64> {
    let digits_end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(digits_end);
    if number.is_empty() || number == "-" || !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    number.parse().ok()
}

/// Parse a temperature reply (`63~65C` or `63 65`) into (min, max).
pub fn parse_temperature(raw: &str) -> Option<(i64, i64)> {
    let text = raw.trim().trim_end_matches(['C', 'c']);
    let mut parts = text
        .split(|c: char| c == '~' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let low = parts.next()?.parse().ok()?;
    let high = parts.next()?.parse().ok()?;
    Some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_text() {
        let forward = TelloCommand::new_move(MoveDirection::Forward, 50).unwrap();
        assert_eq!(forward.to_wire(), "forward 50");

        let ccw = TelloCommand::new_rotate(Rotation::CounterClockwise, 90).unwrap();
        assert_eq!(ccw.to_wire(), "ccw 90");

        assert_eq!(TelloCommand::Battery.to_wire(), "battery?");
        assert_eq!(TelloCommand::Flip(FlipDirection::Left).to_wire(), "flip l");
        assert_eq!(
            TelloCommand::new_go(100, -50, 0, 30).unwrap().to_wire(),
            "go 100 -50 0 30"
        );
        assert_eq!(
            TelloCommand::new_curve((20, 20, 0), (60, 40, 0), 30).unwrap().to_wire(),
            "curve 20 20 0 60 40 0 30"
        );
    }

    #[test]
    fn test_sdk_ranges() {
        assert!(TelloCommand::new_move(MoveDirection::Back, 19).is_err());
        assert!(TelloCommand::new_move(MoveDirection::Back, 500).is_ok());
        assert!(TelloCommand::new_rotate(Rotation::Clockwise, 0).is_err());
        assert!(TelloCommand::new_rotate(Rotation::Clockwise, 360).is_ok());
        assert!(TelloCommand::new_rotate(Rotation::Clockwise, 361).is_err());
        assert!(TelloCommand::new_speed(101).is_err());
        assert!(TelloCommand::new_go(501, 0, 0, 50).is_err());
        assert!(TelloCommand::new_curve((0, 0, 0), (50, 50, 0), 61).is_err());
    }

    #[test]
    fn test_flip_parse() {
        assert_eq!(FlipDirection::parse("b").unwrap(), FlipDirection::Back);
        assert!(FlipDirection::parse("x").is_err());
    }

    #[test]
    fn test_response_parse() {
        assert_eq!(TelloResponse::parse("ok"), TelloResponse::Ok);
        assert_eq!(TelloResponse::parse("OK\r\n"), TelloResponse::Ok);
        assert_eq!(TelloResponse::parse("87\r\n"), TelloResponse::Value(87));
        assert_eq!(TelloResponse::parse("30dm"), TelloResponse::Value(30));
        assert!(matches!(
            TelloResponse::parse("error Motor stop"),
            TelloResponse::Error(_)
        ));
        assert_eq!(
            TelloResponse::parse("63~65C"),
            TelloResponse::Text("63~65C".into())
        );
    }

    #[test]
    fn test_temperature_parse() {
        assert_eq!(parse_temperature("63~65C"), Some((63, 65)));
        assert_eq!(parse_temperature("63 65"), Some((63, 65)));
        assert_eq!(parse_temperature("hot"), None);
    }
}
