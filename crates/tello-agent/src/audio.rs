//! PCM16 audio plumbing for the voice session.
//!
//! Microphone and speaker are file-like: raw 24 kHz mono PCM16 is read
//! from a file or stdin and the model's audio is appended to a file.

use std::io;
use std::path::Path;
use std::time::Duration;

use tello_realtime::protocol::{CHUNK_BYTES, CHUNK_FRAMES, SAMPLE_RATE};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

/// Playback time of one chunk.
pub fn chunk_duration() -> Duration {
    Duration::from_micros(CHUNK_FRAMES as u64 * 1_000_000 / SAMPLE_RATE as u64)
}

/// Stream PCM16 chunks from `source` (`-` for stdin) at real-time pace.
pub async fn spawn_pcm_reader(source: &str) -> io::Result<mpsc::Receiver<Vec<u8>>> {
    if source == "-" {
        tracing::info!("Reading microphone audio from stdin");
        Ok(spawn_chunk_reader(tokio::io::stdin(), Some(chunk_duration())))
    } else {
        let file = File::open(source).await?;
        tracing::info!("Reading microphone audio from {}", source);
        Ok(spawn_chunk_reader(file, Some(chunk_duration())))
    }
}

/// Read `CHUNK_BYTES` chunks until EOF, optionally sleeping between them.
/// The channel closes when the input ends.
pub fn spawn_chunk_reader<R>(mut reader: R, pace: Option<Duration>) -> mpsc::Receiver<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut ticker = pace.map(tokio::time::interval);
        loop {
            if let Some(ticker) = ticker.as_mut() {
                ticker.tick().await;
            }

            let mut chunk = vec![0u8; CHUNK_BYTES];
            let mut filled = 0;
            while filled < CHUNK_BYTES {
                match reader.read(&mut chunk[filled..]).await {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) => {
                        tracing::error!("Audio input error: {}", e);
                        return;
                    }
                }
            }

            if filled == 0 {
                tracing::info!("Audio input finished");
                return;
            }
            chunk.truncate(filled);
            if tx.send(chunk).await.is_err() {
                return;
            }
            if filled < CHUNK_BYTES {
                tracing::info!("Audio input finished");
                return;
            }
        }
    });

    rx
}

/// Appends decoded model audio to a raw PCM file.
pub struct PcmWriter {
    file: File,
    written: u64,
}

impl PcmWriter {
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        Ok(Self { file, written: 0 })
    }

    pub async fn write(&mut self, pcm: &[u8]) -> io::Result<()> {
        self.file.write_all(pcm).await?;
        self.written += pcm.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub async fn finish(mut self) -> io::Result<()> {
        self.file.flush().await
    }
}
