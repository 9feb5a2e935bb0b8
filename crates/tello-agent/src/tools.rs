//! Functions exposed to the realtime model and their dispatch.

use serde_json::{json, Value};
use tello_core::commands::MoveDirection;
use tello_core::wire::Rotation;
use tello_realtime::ToolDefinition;
use tello_vision::Focus;

use crate::controller::DroneController;

pub const INSTRUCTIONS: &str = "You are a real-time drone controller assistant. \
You can do simple movements or complex maneuvers by moving in multiple steps.

Execution:
- Execute multi-step commands smoothly, e.g. \"move forward 50cm then turn right\".
- Do not ask for confirmation between normal steps (100cm or less).
- Full rotations are allowed without splitting them up.

Communication:
- Announce what you are starting, give brief updates during long sequences, \
and announce completion. Be conversational but as short as possible.

Safety:
- Ask before distances over 100cm or sequences with more than 4 steps.
- Check the camera first if obstacles are likely.
- Stop immediately if the user says stop, wait, or emergency.

Prefer rotating and moving forward over moving sideways.";

/// Every function the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Takeoff,
    Land,
    Move(MoveDirection),
    Rotate(Rotation),
    GoXyzSpeed,
    CurveXyzSpeed,
    GetDroneStatus,
    CaptureAndAnalyzeImage,
    EmergencyStop,
}

impl Tool {
    pub const ALL: [Tool; 15] = [
        Tool::Takeoff,
        Tool::Land,
        Tool::Move(MoveDirection::Forward),
        Tool::Move(MoveDirection::Back),
        Tool::Move(MoveDirection::Left),
        Tool::Move(MoveDirection::Right),
        Tool::Move(MoveDirection::Up),
        Tool::Move(MoveDirection::Down),
        Tool::Rotate(Rotation::Clockwise),
        Tool::Rotate(Rotation::CounterClockwise),
        Tool::GoXyzSpeed,
        Tool::CurveXyzSpeed,
        Tool::GetDroneStatus,
        Tool::CaptureAndAnalyzeImage,
        Tool::EmergencyStop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Takeoff => "takeoff",
            Tool::Land => "land",
            Tool::Move(MoveDirection::Forward) => "move_forward",
            Tool::Move(MoveDirection::Back) => "move_backward",
            Tool::Move(MoveDirection::Left) => "move_left",
            Tool::Move(MoveDirection::Right) => "move_right",
            Tool::Move(MoveDirection::Up) => "move_up",
            Tool::Move(MoveDirection::Down) => "move_down",
            Tool::Rotate(Rotation::Clockwise) => "rotate_clockwise",
            Tool::Rotate(Rotation::CounterClockwise) => "rotate_counter_clockwise",
            Tool::GoXyzSpeed => "go_xyz_speed",
            Tool::CurveXyzSpeed => "curve_xyz_speed",
            Tool::GetDroneStatus => "get_drone_status",
            Tool::CaptureAndAnalyzeImage => "capture_and_analyze_image",
            Tool::EmergencyStop => "emergency_stop",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn definition(self) -> ToolDefinition {
        let no_params = json!({"type": "object", "properties": {}});
        let (description, parameters) = match self {
            Tool::Takeoff => (
                "Take off the drone safely - only use when drone is on ground".to_string(),
                no_params,
            ),
            Tool::Land => (
                "Land the drone safely at current location".to_string(),
                no_params,
            ),
            Tool::Move(direction) => {
                let label = match direction {
                    MoveDirection::Back => "backward",
                    other => other.as_str(),
                };
                let recommended = match direction {
                    MoveDirection::Up | MoveDirection::Down => "20-80cm recommended",
                    _ => "20-100cm recommended",
                };
                (
                    format!("Move drone {} by specified distance", label),
                    json!({
                        "type": "object",
                        "properties": {
                            "distance": {
                                "type": "integer",
                                "description": format!("Distance in centimeters ({})", recommended),
                                "minimum": 20,
                                "maximum": 100
                            }
                        },
                        "required": ["distance"]
                    }),
                )
            }
            Tool::Rotate(rotation) => {
                let label = match rotation {
                    Rotation::Clockwise => "clockwise",
                    Rotation::CounterClockwise => "counter-clockwise",
                };
                (
                    format!("Rotate drone {} by specified angle", label),
                    json!({
                        "type": "object",
                        "properties": {
                            "angle": {
                                "type": "integer",
                                "description": "Rotation angle in degrees (1-360)",
                                "minimum": 1,
                                "maximum": 360
                            }
                        },
                        "required": ["angle"]
                    }),
                )
            }
            Tool::GoXyzSpeed => (
                "Fly straight to x/y/z (cm, relative to the drone) at the given speed".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "x": {"type": "integer", "minimum": -500, "maximum": 500},
                        "y": {"type": "integer", "minimum": -500, "maximum": 500},
                        "z": {"type": "integer", "minimum": -500, "maximum": 500},
                        "speed": {"type": "integer", "description": "cm/s", "minimum": 10, "maximum": 100}
                    },
                    "required": ["x", "y", "z", "speed"]
                }),
            ),
            Tool::CurveXyzSpeed => (
                "Fly a curve through waypoint (x1,y1,z1) to destination (x2,y2,z2), in cm relative to the drone".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "x1": {"type": "integer"},
                        "y1": {"type": "integer"},
                        "z1": {"type": "integer"},
                        "x2": {"type": "integer"},
                        "y2": {"type": "integer"},
                        "z2": {"type": "integer"},
                        "speed": {"type": "integer", "description": "cm/s", "minimum": 10, "maximum": 60}
                    },
                    "required": ["x1", "y1", "z1", "x2", "y2", "z2", "speed"]
                }),
            ),
            Tool::GetDroneStatus => (
                "Get current drone status including battery, height, and flight state".to_string(),
                no_params,
            ),
            Tool::CaptureAndAnalyzeImage => {
                let focus: Vec<&str> = Focus::ALL.iter().map(Focus::as_str).collect();
                (
                    "Capture current camera view and provide description of what the drone sees"
                        .to_string(),
                    json!({
                        "type": "object",
                        "properties": {
                            "focus": {
                                "type": "string",
                                "description": format!("What to focus on: {}", focus.join(", ")),
                                "enum": focus
                            },
                            "query": {
                                "type": "string",
                                "description": "Optional question about the view, e.g. 'how many chairs' or 'find the door'"
                            }
                        },
                        "required": ["focus"]
                    }),
                )
            }
            Tool::EmergencyStop => (
                "Emergency stop - immediately stop all movement and hover".to_string(),
                no_params,
            ),
        };
        ToolDefinition::function(self.name(), description, parameters)
    }
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL.into_iter().map(Tool::definition).collect()
}

fn int_arg(arguments: &Value, key: &str) -> Result<i64, String> {
    let value = arguments
        .get(key)
        .ok_or_else(|| format!("missing parameter '{}'", key))?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| format!("parameter '{}' must be an integer", key))
}

fn triple(arguments: &Value, keys: [&str; 3]) -> Result<(i64, i64, i64), String> {
    Ok((
        int_arg(arguments, keys[0])?,
        int_arg(arguments, keys[1])?,
        int_arg(arguments, keys[2])?,
    ))
}

/// Run a tool call and produce the text sent back as its output.
pub async fn dispatch(controller: &mut DroneController, name: &str, arguments: &Value) -> String {
    let Some(tool) = Tool::from_name(name) else {
        let message = format!("Unknown function: {}", name);
        tracing::error!("{}", message);
        return message;
    };

    match run(controller, tool, arguments).await {
        Ok(result) => {
            tracing::info!("{}: {}", name, result);
            result
        }
        Err(e) => {
            let message = format!("Function {} error: {}", name, e);
            tracing::error!("{}", message);
            message
        }
    }
}

async fn run(
    controller: &mut DroneController,
    tool: Tool,
    arguments: &Value,
) -> Result<String, String> {
    Ok(match tool {
        Tool::Takeoff => controller.takeoff().await,
        Tool::Land => controller.land().await,
        Tool::Move(direction) => {
            let distance = int_arg(arguments, "distance")?;
            controller.move_in(direction, distance).await
        }
        Tool::Rotate(rotation) => {
            let angle = int_arg(arguments, "angle")?;
            controller.rotate(rotation, angle).await
        }
        Tool::GoXyzSpeed => {
            let (x, y, z) = triple(arguments, ["x", "y", "z"])?;
            let speed = int_arg(arguments, "speed")?;
            controller.go_xyz_speed(x, y, z, speed).await
        }
        Tool::CurveXyzSpeed => {
            let waypoint = triple(arguments, ["x1", "y1", "z1"])?;
            let destination = triple(arguments, ["x2", "y2", "z2"])?;
            let speed = int_arg(arguments, "speed")?;
            controller.curve_xyz_speed(waypoint, destination, speed).await
        }
        Tool::GetDroneStatus => controller.get_drone_status().await,
        Tool::CaptureAndAnalyzeImage => {
            let request = ["query", "focus"]
                .iter()
                .filter_map(|key| arguments.get(*key).and_then(Value::as_str))
                .find(|value| !value.trim().is_empty())
                .unwrap_or("objects");
            controller.capture_and_analyze_image(request).await
        }
        Tool::EmergencyStop => controller.emergency_stop().await,
    })
}
