//! Drone link used by the agent: a restricted real Tello or a simulator.

use tello_core::commands::MoveDirection;
use tello_core::wire::{FlipDirection, Rotation};
use tello_core::{TelloCommand, TelloResponse};

use crate::client::expect_ok;
use crate::error::{Result, SdkError};
use crate::restricted::RestrictedTello;
use crate::simulated::SimulatedTello;

pub enum DroneLink {
    Real(RestrictedTello),
    Simulated(SimulatedTello),
}

impl DroneLink {
    pub fn is_simulated(&self) -> bool {
        matches!(self, DroneLink::Simulated(_))
    }

    pub async fn connect(&mut self) -> Result<()> {
        match self {
            DroneLink::Real(tello) => tello.connect().await,
            DroneLink::Simulated(_) => Ok(()),
        }
    }

    pub async fn execute(&mut self, command: &TelloCommand) -> Result<TelloResponse> {
        match self {
            DroneLink::Real(tello) => tello.execute(command).await,
            DroneLink::Simulated(sim) => Ok(sim.execute(command)),
        }
    }

    async fn control(&mut self, command: TelloCommand) -> Result<()> {
        let response = self.execute(&command).await?;
        expect_ok(&command, response)
    }

    pub async fn takeoff(&mut self) -> Result<()> {
        self.control(TelloCommand::Takeoff).await
    }

    pub async fn land(&mut self) -> Result<()> {
        self.control(TelloCommand::Land).await
    }

    pub async fn emergency(&mut self) -> Result<()> {
        self.control(TelloCommand::Emergency).await
    }

    pub async fn hover(&mut self) -> Result<()> {
        self.control(TelloCommand::Stop).await
    }

    pub async fn move_by(&mut self, direction: MoveDirection, distance_cm: i64) -> Result<()> {
        self.control(TelloCommand::new_move(direction, distance_cm)?).await
    }

    pub async fn rotate(&mut self, rotation: Rotation, degrees: i64) -> Result<()> {
        self.control(TelloCommand::new_rotate(rotation, degrees)?).await
    }

    pub async fn flip(&mut self, direction: FlipDirection) -> Result<()> {
        self.control(TelloCommand::Flip(direction)).await
    }

    pub async fn set_speed(&mut self, speed: i64) -> Result<()> {
        self.control(TelloCommand::new_speed(speed)?).await
    }

    pub async fn go(&mut self, x: i64, y: i64, z: i64, speed: i64) -> Result<()> {
        self.control(TelloCommand::new_go(x, y, z, speed)?).await
    }

    pub async fn curve(
        &mut self,
        waypoint: (i64, i64, i64),
        destination: (i64, i64, i64),
        speed: i64,
    ) -> Result<()> {
        self.control(TelloCommand::new_curve(waypoint, destination, speed)?)
            .await
    }

    pub async fn stream_on(&mut self) -> Result<()> {
        self.control(TelloCommand::StreamOn).await
    }

    pub async fn stream_off(&mut self) -> Result<()> {
        self.control(TelloCommand::StreamOff).await
    }

    pub async fn battery(&mut self) -> Result<i64> {
        self.query(TelloCommand::Battery).await
    }

    pub async fn height(&mut self) -> Result<i64> {
        self.query(TelloCommand::Height).await
    }

    async fn query(&mut self, command: TelloCommand) -> Result<i64> {
        let response = self.execute(&command).await?;
        response.value().ok_or_else(|| SdkError::UnexpectedResponse {
            command: command.to_wire(),
            reply: format!("{:?}", response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_link_accepts_flight() {
        let mut link = DroneLink::Simulated(SimulatedTello::new());
        link.connect().await.unwrap();
        link.takeoff().await.unwrap();
        link.move_by(MoveDirection::Forward, 50).await.unwrap();
        link.rotate(Rotation::Clockwise, 90).await.unwrap();
        assert_eq!(link.battery().await.unwrap(), 100);
        link.land().await.unwrap();

        match &link {
            DroneLink::Simulated(sim) => {
                assert_eq!(
                    sim.sent_commands(),
                    ["takeoff", "forward 50", "cw 90", "battery?", "land"]
                );
            }
            DroneLink::Real(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_move_is_not_sent() {
        let mut link = DroneLink::Simulated(SimulatedTello::new());
        let err = link.move_by(MoveDirection::Up, 5).await.unwrap_err();
        assert!(matches!(err, SdkError::InvalidCommand(_)));
        if let DroneLink::Simulated(sim) = &link {
            assert!(sim.sent_commands().is_empty());
        }
    }
}
