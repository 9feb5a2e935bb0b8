//! UDP command client for the Tello.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tello_core::wire::parse_temperature;
use tello_core::{TelloCommand, TelloResponse};
use tokio::net::UdpSocket;

use crate::error::{Result, SdkError};

/// Network settings for a Tello.
#[derive(Debug, Clone)]
pub struct TelloConfig {
    pub ip: IpAddr,
    /// Drone command port
    pub command_port: u16,
    /// Local port the command socket binds to (0 picks a free port)
    pub local_port: u16,
    pub state_port: u16,
    pub video_port: u16,
    pub response_timeout: Duration,
}

impl Default for TelloConfig {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 10, 1)),
            command_port: 8889,
            local_port: 8889,
            state_port: 8890,
            video_port: 11111,
            response_timeout: Duration::from_secs(10),
        }
    }
}

impl TelloConfig {
    pub fn drone_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.command_port)
    }
}

/// Client for the Tello command channel.
///
/// One command is in flight at a time: each call sends a datagram and
/// waits for the matching reply.
pub struct TelloClient {
    socket: UdpSocket,
    drone_addr: SocketAddr,
    response_timeout: Duration,
    connected: bool,
}

impl TelloClient {
    /// Bind the local command socket.
    pub async fn bind(config: &TelloConfig) -> Result<Self> {
        let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.local_port);
        let socket = UdpSocket::bind(local).await?;
        tracing::debug!("Tello command socket bound on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            drone_addr: config.drone_addr(),
            response_timeout: config.response_timeout,
            connected: false,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Enter SDK mode. The drone answers `ok` once it accepts commands.
    pub async fn connect(&mut self) -> Result<()> {
        let reply = self.send_command("command").await?;
        if reply.to_ascii_lowercase().contains("ok") {
            self.connected = true;
            tracing::info!("Tello connected at {}", self.drone_addr);
            Ok(())
        } else {
            Err(SdkError::Rejected {
                command: "command".into(),
                reply,
            })
        }
    }

    /// Send a raw command and return the reply text.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        self.drain_stale_replies();

        tracing::debug!("-> {}", command);
        self.socket.send_to(command.as_bytes(), self.drone_addr).await?;

        let mut buf = [0u8; 1024];
        let wait = async {
            loop {
                let (len, from) = self.socket.recv_from(&mut buf).await?;
                if from.ip() == self.drone_addr.ip() {
                    return Ok::<_, std::io::Error>(len);
                }
                tracing::debug!("Ignoring datagram from {}", from);
            }
        };

        let len = match tokio::time::timeout(self.response_timeout, wait).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SdkError::Timeout {
                    command: command.to_string(),
                    timeout: self.response_timeout,
                })
            }
        };

        let reply = String::from_utf8_lossy(&buf[..len]).trim().to_string();
        tracing::debug!("<- {}", reply);
        Ok(reply)
    }

    /// Send a typed command and classify the reply.
    pub async fn execute(&mut self, command: &TelloCommand) -> Result<TelloResponse> {
        let reply = self.send_command(&command.to_wire()).await?;
        Ok(TelloResponse::parse(&reply))
    }

    pub async fn battery(&mut self) -> Result<i64> {
        self.query_value(TelloCommand::Battery).await
    }

    pub async fn height(&mut self) -> Result<i64> {
        self.query_value(TelloCommand::Height).await
    }

    pub async fn speed(&mut self) -> Result<i64> {
        self.query_value(TelloCommand::Speed).await
    }

    /// Temperature range (min, max) in °C.
    pub async fn temperature(&mut self) -> Result<(i64, i64)> {
        let command = TelloCommand::Temperature.to_wire();
        let reply = self.send_command(&command).await?;
        parse_temperature(&reply).ok_or(SdkError::UnexpectedResponse { command, reply })
    }

    pub async fn wifi(&mut self) -> Result<String> {
        self.send_command(&TelloCommand::Wifi.to_wire()).await
    }

    pub async fn flight_time(&mut self) -> Result<String> {
        self.send_command(&TelloCommand::FlightTime.to_wire()).await
    }

    async fn query_value(&mut self, command: TelloCommand) -> Result<i64> {
        let wire = command.to_wire();
        let reply = self.send_command(&wire).await?;
        TelloResponse::parse(&reply)
            .value()
            .ok_or(SdkError::UnexpectedResponse {
                command: wire,
                reply,
            })
    }

    // Replies that arrive after a timeout would otherwise be read as the
    // answer to the next command.
    fn drain_stale_replies(&self) {
        let mut buf = [0u8; 1024];
        while let Ok((len, from)) = self.socket.try_recv_from(&mut buf) {
            tracing::debug!(
                "Discarding stale reply from {}: {}",
                from,
                String::from_utf8_lossy(&buf[..len]).trim()
            );
        }
    }
}

/// Turn a control-command reply into a result.
pub(crate) fn expect_ok(command: &TelloCommand, response: TelloResponse) -> Result<()> {
    match response {
        TelloResponse::Ok => Ok(()),
        TelloResponse::Error(reply) => Err(SdkError::Rejected {
            command: command.to_wire(),
            reply,
        }),
        TelloResponse::Value(v) => Err(SdkError::UnexpectedResponse {
            command: command.to_wire(),
            reply: v.to_string(),
        }),
        TelloResponse::Text(reply) => Err(SdkError::UnexpectedResponse {
            command: command.to_wire(),
            reply,
        }),
    }
}
