//! Listener for the Tello state broadcast.

use std::net::{Ipv4Addr, SocketAddr};

use tello_core::TelloTelemetry;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::error::Result;

/// Bind the state port and publish every parsed packet.
///
/// The background task stops once every receiver has been dropped.
pub async fn spawn_state_listener(port: u16) -> Result<watch::Receiver<Option<TelloTelemetry>>> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await?;
    tracing::info!("Listening for Tello state on {}", socket.local_addr()?);
    Ok(spawn_on_socket(socket))
}

pub(crate) fn spawn_on_socket(socket: UdpSocket) -> watch::Receiver<Option<TelloTelemetry>> {
    let (tx, rx) = watch::channel(None);

    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = socket.recv_from(&mut buf) => {
                    let len = match received {
                        Ok((len, _)) => len,
                        Err(e) => {
                            tracing::error!("State socket error: {}", e);
                            break;
                        }
                    };
                    let packet = String::from_utf8_lossy(&buf[..len]);
                    match TelloTelemetry::parse(&packet) {
                        Some(telemetry) => {
                            if tx.send(Some(telemetry)).is_err() {
                                break;
                            }
                        }
                        None => {
                            tracing::debug!("Skipping malformed state packet: {}", packet.trim())
                        }
                    }
                }
            }
        }
        tracing::debug!("State listener stopped");
    });

    rx
}
