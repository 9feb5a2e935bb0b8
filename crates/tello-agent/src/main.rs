//! drone-agent - talk to a Tello through the realtime speech API

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tello_agent::audio::{spawn_pcm_reader, PcmWriter};
use tello_agent::config::DEFAULT_LOG_LEVEL;
use tello_agent::session::spawn_telemetry_sync;
use tello_agent::{Config, DroneController, VoiceSession};
use tello_core::{FlightMode, Restrictions, RestrictionsUpdate};
use tello_realtime::RealtimeClient;
use tello_sdk::state_stream::spawn_state_listener;
use tello_sdk::{DroneLink, RestrictedTello, SimulatedTello};
use tello_vision::{AzureVisionClient, FrameSource, VisionAnalyzer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Voice-controlled Tello agent
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Simulate drone and camera (the default)
    #[arg(long)]
    vision_only: bool,

    /// Fly the real drone
    #[arg(long)]
    real_drone: bool,

    /// Drone command port (overrides TELLO_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Raw 24 kHz mono PCM16 microphone input, `-` for stdin
    #[arg(long)]
    audio_in: Option<String>,

    /// File that receives the model's PCM16 audio
    #[arg(long)]
    audio_out: Option<PathBuf>,

    /// Type requests on stdin instead of speaking them
    #[arg(long, conflicts_with = "audio_in")]
    text: bool,

    /// JPEG refreshed by a frame grabber, analyzed for camera requests
    #[arg(long)]
    frame: Option<PathBuf>,

    /// JSON restriction overrides for the real drone
    #[arg(long)]
    restrictions: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = Config::from_env();
    let log_level = match &config {
        Ok(config) => config.log_level.as_str(),
        Err(_) => DEFAULT_LOG_LEVEL,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::error!("Set them in the environment or a .env file");
            return Err(e.into());
        }
    };
    if let Some(port) = args.port {
        config.tello_port = port;
    }

    let mode = FlightMode::from_flags(args.real_drone);
    if args.vision_only && args.real_drone {
        tracing::warn!("--real-drone overrides --vision-only");
    }
    tracing::info!("Starting drone agent in {} mode", mode.label());

    let link = if mode.is_simulated() {
        DroneLink::Simulated(SimulatedTello::new())
    } else {
        let mut restrictions = Restrictions::full_access();
        if let Some(path) = &args.restrictions {
            restrictions.apply(RestrictionsUpdate::from_json_file(path)?);
        }
        let tello = RestrictedTello::bind(&config.tello_config(), restrictions)
            .await
            .context("binding Tello command socket")?;
        DroneLink::Real(tello)
    };

    let vision = build_vision(&config, &args, mode)?;
    let mut controller = DroneController::new(link, mode, vision);

    if !mode.is_simulated() {
        controller.setup().await;
        match spawn_state_listener(config.tello_state_port).await {
            Ok(telemetry) => spawn_telemetry_sync(telemetry, controller.shared_state()),
            Err(e) => tracing::warn!("Drone state listener unavailable: {}", e),
        }
    }

    let realtime = RealtimeClient {
        api_version: config.realtime_api_version.clone(),
        ..RealtimeClient::new(
            &config.openai_endpoint,
            &config.realtime_deployment,
            &config.openai_api_key,
        )
    };

    let mut session = VoiceSession::new(realtime, controller);
    if let Some(source) = &args.audio_in {
        let rx = spawn_pcm_reader(source)
            .await
            .with_context(|| format!("opening audio input {}", source))?;
        session = session.with_audio_input(rx);
    }
    if args.text {
        session = session.with_text_input(spawn_stdin_lines());
    }
    if let Some(path) = &args.audio_out {
        let writer = PcmWriter::create(path)
            .await
            .with_context(|| format!("opening audio output {}", path.display()))?;
        session = session.with_audio_output(writer);
    }
    if args.audio_in.is_none() && !args.text {
        tracing::warn!("No --audio-in or --text given; only the model can start a conversation");
    }

    session.run().await
}

fn build_vision(config: &Config, args: &Args, mode: FlightMode) -> Result<VisionAnalyzer> {
    let Some(frame) = args.frame.clone() else {
        if !mode.is_simulated() {
            tracing::warn!("No --frame given; camera requests get simulated answers");
        }
        return Ok(VisionAnalyzer::simulated());
    };

    let client = match (&config.vision_endpoint, &config.vision_key) {
        (Some(endpoint), Some(key)) => Some(AzureVisionClient::new(endpoint, key)?),
        _ => {
            tracing::warn!("AZURE_AI_VISION_ENDPOINT / AZURE_AI_VISION_KEY not set; image analysis will fail");
            None
        }
    };

    Ok(VisionAnalyzer::new(FrameSource::File(frame), client)
        .with_threshold(config.vision_threshold))
}

fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}
