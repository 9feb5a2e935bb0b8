//! Tello client with organiser-defined restrictions.

use tello_core::{RestrictionError, RestrictionManager, Restrictions, RestrictionsUpdate};
use tello_core::{TelloCommand, TelloResponse};

use crate::client::{TelloClient, TelloConfig};
use crate::error::Result;

/// A [`TelloClient`] that runs every outgoing command past a
/// [`RestrictionManager`]. Refused commands never reach the drone.
pub struct RestrictedTello {
    client: TelloClient,
    restrictions: RestrictionManager,
}

impl RestrictedTello {
    pub fn new(client: TelloClient, restrictions: Restrictions) -> Self {
        Self {
            client,
            restrictions: RestrictionManager::new(restrictions),
        }
    }

    pub async fn bind(config: &TelloConfig, restrictions: Restrictions) -> Result<Self> {
        Ok(Self::new(TelloClient::bind(config).await?, restrictions))
    }

    pub fn client(&self) -> &TelloClient {
        &self.client
    }

    pub fn restrictions(&self) -> &Restrictions {
        self.restrictions.restrictions()
    }

    pub fn update_restrictions(&mut self, update: RestrictionsUpdate) {
        self.restrictions.update(update);
        tracing::info!("Restrictions updated: {:?}", self.restrictions.restrictions());
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.client.connect().await
    }

    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        if let Err(reason) = self.restrictions.check(command) {
            tracing::warn!("Refused '{}': {}", command, reason);
            return Err(reason.into());
        }
        self.client.send_command(command).await
    }

    pub async fn execute(&mut self, command: &TelloCommand) -> Result<TelloResponse> {
        if *command == TelloCommand::Emergency && !self.restrictions.emergency_allowed() {
            tracing::warn!("Refused emergency stop: not allowed by restrictions");
            return Err(RestrictionError::EmergencyNotAllowed.into());
        }
        let wire = command.to_wire();
        // Emergency bypasses the verb allow-list once explicitly permitted.
        let reply = if *command == TelloCommand::Emergency {
            self.client.send_command(&wire).await?
        } else {
            self.send_command(&wire).await?
        };
        Ok(TelloResponse::parse(&reply))
    }
}
