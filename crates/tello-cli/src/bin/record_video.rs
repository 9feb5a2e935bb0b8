//! Record the Tello's raw H.264 stream to a file.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tello_sdk::video::spawn_video_receiver;
use tello_sdk::{TelloClient, TelloCommand, TelloConfig, TelloResponse};
use tokio::io::AsyncWriteExt;
use tokio::time;

/// Record the drone's video stream (raw H.264, playable with ffplay)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Output file
    #[arg(long, short)]
    output: PathBuf,

    /// Recording length in seconds
    #[arg(long, default_value_t = 10)]
    seconds: u64,

    /// Drone IP address
    #[arg(long, default_value = "192.168.10.1")]
    ip: IpAddr,

    /// Drone command port
    #[arg(long, default_value_t = 8889)]
    port: u16,

    /// Local video port the drone streams to
    #[arg(long, default_value_t = 11111)]
    video_port: u16,
}

async fn stream_command(tello: &mut TelloClient, command: TelloCommand) -> anyhow::Result<()> {
    match tello.execute(&command).await? {
        TelloResponse::Ok => Ok(()),
        other => anyhow::bail!("{} refused: {:?}", command.to_wire(), other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tello_cli::init_logging();
    let args = Args::parse();

    let config = TelloConfig {
        ip: args.ip,
        command_port: args.port,
        video_port: args.video_port,
        ..Default::default()
    };
    let mut tello = TelloClient::bind(&config).await?;
    tello.connect().await.context("entering SDK mode")?;

    let mut frames = spawn_video_receiver(config.video_port, 64).await?;
    stream_command(&mut tello, TelloCommand::StreamOn).await?;

    let mut file = tokio::fs::File::create(&args.output)
        .await
        .with_context(|| format!("creating {}", args.output.display()))?;

    println!("Recording {}s of video to {}...", args.seconds, args.output.display());
    let deadline = time::sleep(Duration::from_secs(args.seconds));
    tokio::pin!(deadline);

    let mut count = 0usize;
    let mut bytes = 0usize;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            frame = frames.recv() => match frame {
                Some(frame) => {
                    file.write_all(&frame).await?;
                    count += 1;
                    bytes += frame.len();
                }
                None => break,
            },
        }
    }
    file.flush().await?;

    if let Err(e) = stream_command(&mut tello, TelloCommand::StreamOff).await {
        eprintln!("Failed to stop video stream: {}", e);
    }
    println!("Wrote {} frames ({} bytes)", count, bytes);
    Ok(())
}
