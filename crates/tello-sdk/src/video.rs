//! H.264 video stream receiver (UDP port 11111).
//!
//! The Tello splits each encoded frame into 1460-byte datagrams; the last
//! datagram of a frame is shorter.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::error::Result;

/// Size of a full video datagram.
pub const VIDEO_PACKET_SIZE: usize = 1460;
/// Frames larger than this are discarded as corrupt.
pub const MAX_FRAME_BYTES: usize = 2 * 1024 * 1024;

/// Reassembles datagrams into frames.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    overflowed: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a datagram; returns the frame once it is complete.
    pub fn push(&mut self, packet: &[u8]) -> Option<Vec<u8>> {
        if self.buf.len() + packet.len() > MAX_FRAME_BYTES {
            self.overflowed = true;
            self.buf.clear();
        } else if !self.overflowed {
            self.buf.extend_from_slice(packet);
        }

        if packet.len() >= VIDEO_PACKET_SIZE {
            return None;
        }

        if std::mem::take(&mut self.overflowed) {
            tracing::warn!("Dropped oversized video frame");
            return None;
        }
        if self.buf.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.buf))
    }
}

/// Bind the video port and forward complete frames.
///
/// Frames are dropped when the consumer falls behind.
pub async fn spawn_video_receiver(port: u16, capacity: usize) -> Result<mpsc::Receiver<Vec<u8>>> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await?;
    tracing::info!("Receiving Tello video on {}", socket.local_addr()?);
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        let mut assembler = FrameAssembler::new();
        let mut buf = vec![0u8; 2048];
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = socket.recv_from(&mut buf) => {
                    let len = match received {
                        Ok((len, _)) => len,
                        Err(e) => {
                            tracing::error!("Video socket error: {}", e);
                            break;
                        }
                    };
                    if let Some(frame) = assembler.push(&buf[..len]) {
                        if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(frame) {
                            break;
                        }
                    }
                }
            }
        }
        tracing::debug!("Video receiver stopped");
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_packet_closes_frame() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.push(&[1u8; VIDEO_PACKET_SIZE]).is_none());
        assert!(assembler.push(&[2u8; VIDEO_PACKET_SIZE]).is_none());
        let frame = assembler.push(&[3u8; 100]).unwrap();
        assert_eq!(frame.len(), 2 * VIDEO_PACKET_SIZE + 100);
        assert_eq!(frame[0], 1);
        assert_eq!(frame[frame.len() - 1], 3);

        let next = assembler.push(&[4u8; 10]).unwrap();
        assert_eq!(next, vec![4u8; 10]);
    }

    #[test]
    fn test_oversized_frame_is_dropped() {
        let mut assembler = FrameAssembler::new();
        let full = [0u8; VIDEO_PACKET_SIZE];
        for _ in 0..(MAX_FRAME_BYTES / VIDEO_PACKET_SIZE + 2) {
            assert!(assembler.push(&full).is_none());
        }
        assert!(assembler.push(&[1u8; 10]).is_none());
        assert_eq!(assembler.push(&[7u8; 5]).unwrap(), vec![7u8; 5]);
    }
}
