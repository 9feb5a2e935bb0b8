//! Simulated drone for vision-only runs.

use tello_core::{TelloCommand, TelloResponse};

/// Answers every command locally and records what was sent.
#[derive(Debug, Default)]
pub struct SimulatedTello {
    sent: Vec<String>,
}

impl SimulatedTello {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands sent so far, in wire format.
    pub fn sent_commands(&self) -> &[String] {
        &self.sent
    }

    pub fn execute(&mut self, command: &TelloCommand) -> TelloResponse {
        self.sent.push(command.to_wire());
        tracing::debug!("[sim] {}", command);
        match command {
            TelloCommand::Battery => TelloResponse::Value(100),
            TelloCommand::Height => TelloResponse::Value(50),
            TelloCommand::Speed => TelloResponse::Value(10),
            TelloCommand::Temperature => TelloResponse::Text("60~62C".into()),
            TelloCommand::Wifi => TelloResponse::Value(90),
            TelloCommand::FlightTime => TelloResponse::Value(0),
            _ => TelloResponse::Ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_replies() {
        let mut sim = SimulatedTello::new();
        assert!(sim.execute(&TelloCommand::Takeoff).is_ok());
        assert_eq!(sim.execute(&TelloCommand::Battery).value(), Some(100));
        assert_eq!(sim.execute(&TelloCommand::Height).value(), Some(50));
        assert_eq!(sim.sent_commands(), ["takeoff", "battery?", "height?"]);
    }
}
