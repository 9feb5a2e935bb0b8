//! Drone handlers invoked by the voice model.
//!
//! Every handler returns the sentence the model should relay; drone and
//! vision failures become part of that sentence instead of errors.

use std::sync::{MutexGuard, PoisonError};

use tello_core::commands::MoveDirection;
use tello_core::wire::Rotation;
use tello_core::{FlightMode, FlightState, SharedFlightState};
use tello_sdk::{DroneLink, SdkError};
use tello_vision::VisionAnalyzer;

/// Height reported after a simulated takeoff.
pub const SIMULATED_TAKEOFF_HEIGHT_CM: u32 = 80;

pub struct DroneController {
    link: DroneLink,
    state: SharedFlightState,
    mode: FlightMode,
    vision: VisionAnalyzer,
}

/// How a drone call went, for building the reply.
enum Outcome {
    Done,
    Failed,
    Error(SdkError),
}

impl From<tello_sdk::Result<()>> for Outcome {
    fn from(result: tello_sdk::Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Done,
            Err(SdkError::Rejected { .. }) => Outcome::Failed,
            Err(e) => Outcome::Error(e),
        }
    }
}

fn direction_label(direction: MoveDirection) -> &'static str {
    match direction {
        MoveDirection::Forward => "forward",
        MoveDirection::Back => "backward",
        MoveDirection::Left => "left",
        MoveDirection::Right => "right",
        MoveDirection::Up => "up",
        MoveDirection::Down => "down",
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl DroneController {
    pub fn new(link: DroneLink, mode: FlightMode, vision: VisionAnalyzer) -> Self {
        Self {
            link,
            state: FlightState::shared(),
            mode,
            vision,
        }
    }

    /// Vision-only controller backed by the simulator.
    pub fn simulated() -> Self {
        Self::new(
            DroneLink::Simulated(Default::default()),
            FlightMode::VisionOnly,
            VisionAnalyzer::simulated(),
        )
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    pub fn shared_state(&self) -> SharedFlightState {
        self.state.clone()
    }

    pub fn snapshot(&self) -> FlightState {
        self.state().clone()
    }

    pub fn link_mut(&mut self) -> &mut DroneLink {
        &mut self.link
    }

    fn state(&self) -> MutexGuard<'_, FlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn simulated_mode(&self) -> bool {
        self.mode.is_simulated()
    }

    /// Re-read height and battery from the drone. Failed reads keep the old values.
    async fn refresh(&mut self, height: bool, battery: bool) {
        if height {
            match self.link.height().await {
                Ok(h) => self.state().set_height(h),
                Err(e) => tracing::debug!("Height read failed: {}", e),
            }
        }
        if battery {
            match self.link.battery().await {
                Ok(b) => self.state().set_battery(b),
                Err(e) => tracing::debug!("Battery read failed: {}", e),
            }
        }
    }

    pub async fn takeoff(&mut self) -> String {
        tracing::info!("Taking off...");

        if self.state().is_flying {
            return "Drone is already flying!".to_string();
        }

        if self.simulated_mode() {
            self.state().mark_airborne(SIMULATED_TAKEOFF_HEIGHT_CM);
            return format!(
                "Takeoff successful - hovering at {}cm",
                SIMULATED_TAKEOFF_HEIGHT_CM
            );
        }

        match Outcome::from(self.link.takeoff().await) {
            Outcome::Done => {
                self.state().mark_airborne(0);
                self.refresh(true, true).await;
                let state = self.state();
                format!(
                    "Takeoff successful - height: {}cm, battery: {}%",
                    state.height_cm, state.battery
                )
            }
            Outcome::Failed => "Takeoff failed".to_string(),
            Outcome::Error(e) => format!("Takeoff error: {}", e),
        }
    }

    pub async fn land(&mut self) -> String {
        tracing::info!("Landing...");

        if !self.state().is_flying {
            return "Drone is already on the ground!".to_string();
        }

        if self.simulated_mode() {
            self.state().mark_landed();
            return "Landing successful".to_string();
        }

        match Outcome::from(self.link.land().await) {
            Outcome::Done => {
                self.state().mark_landed();
                "Landing successful".to_string()
            }
            Outcome::Failed => "Landing failed".to_string(),
            Outcome::Error(e) => format!("Landing error: {}", e),
        }
    }

    /// Move in one direction. The movement counter advances even when the
    /// drone refuses the move.
    pub async fn move_in(&mut self, direction: MoveDirection, distance_cm: i64) -> String {
        let label = direction_label(direction);
        tracing::info!("Moving {} {}cm...", label, distance_cm);

        if !self.state().is_flying {
            return match direction {
                MoveDirection::Forward | MoveDirection::Back => {
                    "Cannot move - drone is not flying! Use takeoff first.".to_string()
                }
                _ => "Cannot move - drone is not flying!".to_string(),
            };
        }

        let count = self.state().record_movement();

        if self.simulated_mode() {
            let mut state = self.state();
            return match direction {
                MoveDirection::Forward => {
                    format!("Moved forward {}cm (Movement #{})", distance_cm, count)
                }
                MoveDirection::Up => {
                    state.climb(distance_cm.max(0) as u32);
                    format!("Moved up {}cm - height: {}cm", distance_cm, state.height_cm)
                }
                MoveDirection::Down => {
                    state.descend(distance_cm.max(0) as u32);
                    format!("Moved down {}cm - height: {}cm", distance_cm, state.height_cm)
                }
                _ => format!("Moved {} {}cm", label, distance_cm),
            };
        }

        match Outcome::from(self.link.move_by(direction, distance_cm).await) {
            Outcome::Done => match direction {
                MoveDirection::Forward => {
                    self.refresh(true, true).await;
                    let state = self.state();
                    format!(
                        "Moved forward {}cm - height: {}cm, battery: {}%",
                        distance_cm, state.height_cm, state.battery
                    )
                }
                MoveDirection::Up | MoveDirection::Down => {
                    self.refresh(true, false).await;
                    format!(
                        "Moved {} {}cm - height: {}cm",
                        label,
                        distance_cm,
                        self.state().height_cm
                    )
                }
                _ => format!("Moved {} {}cm", label, distance_cm),
            },
            Outcome::Failed => format!("{} movement failed", capitalized(label)),
            Outcome::Error(e) => format!("{} movement error: {}", capitalized(label), e),
        }
    }

    pub async fn rotate(&mut self, rotation: Rotation, angle_deg: i64) -> String {
        let label = match rotation {
            Rotation::Clockwise => "clockwise",
            Rotation::CounterClockwise => "counter-clockwise",
        };
        tracing::info!("Rotating {} {}°...", label, angle_deg);

        if !self.state().is_flying {
            return "Cannot rotate - drone is not flying!".to_string();
        }

        if self.simulated_mode() {
            return format!("Rotated {} {}°", label, angle_deg);
        }

        match Outcome::from(self.link.rotate(rotation, angle_deg).await) {
            Outcome::Done => format!("Rotated {} {}°", label, angle_deg),
            Outcome::Failed => format!("{} rotation failed", capitalized(label)),
            Outcome::Error(e) => format!("{} rotation error: {}", capitalized(label), e),
        }
    }

    pub async fn go_xyz_speed(&mut self, x: i64, y: i64, z: i64, speed: i64) -> String {
        tracing::info!("Direct movement: ({},{},{}) at {}cm/s", x, y, z, speed);

        if !self.state().is_flying {
            return "Cannot perform direct movement - drone is not flying! Use takeoff first."
                .to_string();
        }

        self.state().record_movement();

        if self.simulated_mode() {
            return format!("Direct movement completed to ({},{},{})", x, y, z);
        }

        match Outcome::from(self.link.go(x, y, z, speed).await) {
            Outcome::Done => {
                self.refresh(true, true).await;
                let state = self.state();
                format!(
                    "Direct movement completed - height: {}cm, battery: {}%",
                    state.height_cm, state.battery
                )
            }
            Outcome::Failed => "Direct movement failed".to_string(),
            Outcome::Error(e) => format!("Direct movement error: {}", e),
        }
    }

    pub async fn curve_xyz_speed(
        &mut self,
        waypoint: (i64, i64, i64),
        destination: (i64, i64, i64),
        speed: i64,
    ) -> String {
        let (x1, y1, z1) = waypoint;
        let (x2, y2, z2) = destination;
        tracing::info!(
            "Curve movement: waypoint({},{},{}) -> destination({},{},{}) at {}cm/s",
            x1, y1, z1, x2, y2, z2, speed
        );

        if !self.state().is_flying {
            return "Cannot perform curve movement - drone is not flying! Use takeoff first."
                .to_string();
        }

        self.state().record_movement();

        if self.simulated_mode() {
            return format!(
                "Curve movement completed: waypoint({},{},{}) → destination({},{},{})",
                x1, y1, z1, x2, y2, z2
            );
        }

        match Outcome::from(self.link.curve(waypoint, destination, speed).await) {
            Outcome::Done => {
                self.refresh(true, true).await;
                let state = self.state();
                format!(
                    "Curve movement completed - height: {}cm, battery: {}%",
                    state.height_cm, state.battery
                )
            }
            Outcome::Failed => "Curve movement failed".to_string(),
            Outcome::Error(e) => format!("Curve movement error: {}", e),
        }
    }

    pub async fn get_drone_status(&mut self) -> String {
        if !self.simulated_mode() {
            self.refresh(true, true).await;
        }
        self.state().status_line()
    }

    pub async fn emergency_stop(&mut self) -> String {
        tracing::warn!("EMERGENCY STOP!");

        if self.simulated_mode() {
            return "EMERGENCY STOP executed (simulation mode)".to_string();
        }

        match Outcome::from(self.link.emergency().await) {
            Outcome::Done => {
                self.state().mark_landed();
                "EMERGENCY STOP executed - drone should hover in place".to_string()
            }
            Outcome::Failed => "Emergency stop failed".to_string(),
            Outcome::Error(e) => format!("Emergency stop error: {}", e),
        }
    }

    pub async fn capture_and_analyze_image(&mut self, focus: &str) -> String {
        let outcome = self.vision.capture_and_analyze(focus).await;
        self.state()
            .record_analysis(outcome.summary.clone(), outcome.obstacles);
        outcome.summary
    }

    /// Connect, start the video stream and read the battery. Real mode only.
    ///
    /// Failures are logged; the session still starts so the operator can
    /// hear what went wrong.
    pub async fn setup(&mut self) {
        if self.simulated_mode() {
            return;
        }

        tracing::info!("Connecting to Tello drone...");
        if let Err(e) = self.link.connect().await {
            tracing::error!("Failed to connect to drone: {}", e);
            return;
        }
        if let Err(e) = self.link.stream_on().await {
            tracing::warn!("Failed to start video stream: {}", e);
        }
        self.refresh(false, true).await;
        tracing::info!("Drone connected, battery: {}%", self.state().battery);
    }

    /// Land if still airborne and stop the video stream. Real mode only.
    pub async fn shutdown(&mut self) {
        if self.simulated_mode() {
            return;
        }

        if self.state().is_flying {
            tracing::info!("Landing drone before shutdown...");
            let reply = self.land().await;
            tracing::info!("{}", reply);
        }
        if let Err(e) = self.link.stream_off().await {
            tracing::warn!("Failed to stop video stream: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_flight_strings() {
        let mut drone = DroneController::simulated();

        assert_eq!(
            drone.move_in(MoveDirection::Forward, 50).await,
            "Cannot move - drone is not flying! Use takeoff first."
        );
        assert_eq!(
            drone.move_in(MoveDirection::Left, 50).await,
            "Cannot move - drone is not flying!"
        );
        assert_eq!(drone.land().await, "Drone is already on the ground!");

        assert_eq!(drone.takeoff().await, "Takeoff successful - hovering at 80cm");
        assert_eq!(drone.takeoff().await, "Drone is already flying!");

        assert_eq!(
            drone.move_in(MoveDirection::Forward, 50).await,
            "Moved forward 50cm (Movement #1)"
        );
        assert_eq!(drone.move_in(MoveDirection::Back, 30).await, "Moved backward 30cm");
        assert_eq!(
            drone.move_in(MoveDirection::Up, 40).await,
            "Moved up 40cm - height: 120cm"
        );
        assert_eq!(
            drone.move_in(MoveDirection::Down, 200).await,
            "Moved down 200cm - height: 0cm"
        );
        assert_eq!(
            drone.rotate(Rotation::Clockwise, 90).await,
            "Rotated clockwise 90°"
        );
        assert_eq!(
            drone.rotate(Rotation::CounterClockwise, 45).await,
            "Rotated counter-clockwise 45°"
        );

        assert_eq!(
            drone.get_drone_status().await,
            "Drone Status: Flying=True, Battery=100%, Height=0cm, Movements=4"
        );
        assert_eq!(drone.land().await, "Landing successful");
        assert_eq!(drone.snapshot().height_cm, 0);
    }

    #[tokio::test]
    async fn test_simulated_rotation_needs_flight() {
        let mut drone = DroneController::simulated();
        assert_eq!(
            drone.rotate(Rotation::Clockwise, 90).await,
            "Cannot rotate - drone is not flying!"
        );
        assert_eq!(
            drone.go_xyz_speed(50, 0, 0, 30).await,
            "Cannot perform direct movement - drone is not flying! Use takeoff first."
        );
    }

    #[tokio::test]
    async fn test_simulated_curve_and_go() {
        let mut drone = DroneController::simulated();
        drone.takeoff().await;
        assert_eq!(
            drone.curve_xyz_speed((20, 20, 0), (40, 0, 0), 30).await,
            "Curve movement completed: waypoint(20,20,0) → destination(40,0,0)"
        );
        assert_eq!(
            drone.go_xyz_speed(50, 0, 20, 30).await,
            "Direct movement completed to (50,0,20)"
        );
        assert_eq!(drone.snapshot().movement_count, 2);
    }

    #[tokio::test]
    async fn test_emergency_and_vision_in_simulation() {
        let mut drone = DroneController::simulated();
        assert_eq!(
            drone.emergency_stop().await,
            "EMERGENCY STOP executed (simulation mode)"
        );

        let reply = drone.capture_and_analyze_image("obstacles").await;
        assert_eq!(reply, "a chair 200 cm ahead.");
        assert_eq!(drone.snapshot().last_image_analysis, "a chair 200 cm ahead.");
        assert_eq!(drone.snapshot().obstacles_detected, vec!["chair".to_string()]);

        drone.capture_and_analyze_image("navigation").await;
        assert!(drone.snapshot().obstacles_detected.is_empty());
    }

    #[tokio::test]
    async fn test_real_mode_reads_back_from_drone() {
        let mut drone = DroneController::new(
            DroneLink::Simulated(Default::default()),
            FlightMode::RealDrone,
            VisionAnalyzer::simulated(),
        );

        assert_eq!(
            drone.takeoff().await,
            "Takeoff successful - height: 50cm, battery: 100%"
        );
        assert_eq!(
            drone.move_in(MoveDirection::Forward, 100).await,
            "Moved forward 100cm - height: 50cm, battery: 100%"
        );
        assert_eq!(
            drone.move_in(MoveDirection::Right, 5).await,
            "Right movement error: invalid command: Distance must be between 20-500cm: 5"
        );
        assert_eq!(drone.snapshot().movement_count, 2);
        assert_eq!(
            drone.emergency_stop().await,
            "EMERGENCY STOP executed - drone should hover in place"
        );
        assert!(!drone.snapshot().is_flying);
    }
}
