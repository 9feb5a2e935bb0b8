//! Voice session: audio in, model events out, tool calls in between.

use std::collections::VecDeque;
use std::sync::PoisonError;

use anyhow::{Context, Result};
use tello_core::{SharedFlightState, TelloTelemetry};
use tello_realtime::protocol::SessionConfig;
use tello_realtime::{BridgeAction, ClientEvent, RealtimeClient, RealtimeSender, SpeechBridge};
use tokio::sync::{mpsc, watch};

use crate::audio::PcmWriter;
use crate::controller::DroneController;
use crate::tools::{self, INSTRUCTIONS};

pub struct VoiceSession {
    client: RealtimeClient,
    controller: DroneController,
    bridge: SpeechBridge,
    audio_in: Option<mpsc::Receiver<Vec<u8>>>,
    text_in: Option<mpsc::Receiver<String>>,
    audio_out: Option<PcmWriter>,
}

impl VoiceSession {
    pub fn new(client: RealtimeClient, controller: DroneController) -> Self {
        Self {
            client,
            controller,
            bridge: SpeechBridge::new(),
            audio_in: None,
            text_in: None,
            audio_out: None,
        }
    }

    /// PCM16 chunks streamed to the input buffer.
    pub fn with_audio_input(mut self, rx: mpsc::Receiver<Vec<u8>>) -> Self {
        self.audio_in = Some(rx);
        self
    }

    /// Typed lines spoken to the model as user messages.
    pub fn with_text_input(mut self, rx: mpsc::Receiver<String>) -> Self {
        self.text_in = Some(rx);
        self
    }

    pub fn with_audio_output(mut self, writer: PcmWriter) -> Self {
        self.audio_out = Some(writer);
        self
    }

    /// Run until the server closes the socket or Ctrl-C.
    pub async fn run(mut self) -> Result<()> {
        let (mut sender, mut receiver) = self
            .client
            .connect()
            .await
            .context("connecting to realtime API")?;

        let session = SessionConfig::new(INSTRUCTIONS, tools::tool_definitions());
        sender
            .send(&ClientEvent::session_update(session))
            .await
            .context("configuring realtime session")?;

        tracing::info!("Real-time drone control started ({} mode)", self.controller.mode().label());
        tracing::info!("Try: 'Take off', 'Move forward 50 centimeters', 'What do you see?', 'Land'");

        let mut mic_open = self.audio_in.is_some();
        let mut mic = self.audio_in.take().unwrap_or_else(|| mpsc::channel(1).1);
        let mut text_open = self.text_in.is_some();
        let mut text = self.text_in.take().unwrap_or_else(|| mpsc::channel(1).1);

        let result = loop {
            tokio::select! {
                chunk = mic.recv(), if mic_open => match chunk {
                    Some(pcm) => {
                        if let Err(e) = sender.send(&ClientEvent::append_audio(&pcm)).await {
                            break Err(e.into());
                        }
                    }
                    None => {
                        tracing::info!("Microphone input ended");
                        mic_open = false;
                    }
                },
                line = text.recv(), if text_open => match line {
                    Some(line) => {
                        let actions = self.bridge.speak(line);
                        if let Err(e) = self.perform(&mut sender, actions).await {
                            break Err(e);
                        }
                    }
                    None => {
                        tracing::debug!("Text input ended");
                        text_open = false;
                    }
                },
                event = receiver.next_event() => match event {
                    Ok(Some(event)) => {
                        let actions = self.bridge.handle(event);
                        if let Err(e) = self.perform(&mut sender, actions).await {
                            break Err(e);
                        }
                    }
                    Ok(None) => {
                        tracing::info!("WebSocket connection closed");
                        break Ok(());
                    }
                    Err(e) => break Err(anyhow::Error::new(e).context("reading realtime events")),
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Real-time control stopped by user");
                    break Ok(());
                }
            }
        };

        self.cleanup(&mut sender).await;
        result
    }

    /// Carry out bridge actions; tool results feed new actions back in.
    async fn perform(
        &mut self,
        sender: &mut RealtimeSender,
        actions: Vec<BridgeAction>,
    ) -> Result<()> {
        let mut queue: VecDeque<BridgeAction> = actions.into();

        while let Some(action) = queue.pop_front() {
            match action {
                BridgeAction::Send(event) => sender.send(&event).await?,
                BridgeAction::PlayAudio(pcm) => {
                    if let Some(out) = self.audio_out.as_mut() {
                        if let Err(e) = out.write(&pcm).await {
                            tracing::warn!("Audio output error: {}", e);
                        }
                    }
                }
                BridgeAction::Transcript(_) => {}
                BridgeAction::CallTool {
                    call_id,
                    name,
                    arguments,
                } => {
                    let output = tools::dispatch(&mut self.controller, &name, &arguments).await;
                    queue.extend(self.bridge.tool_output(call_id, &name, output));
                }
            }
        }
        Ok(())
    }

    async fn cleanup(mut self, sender: &mut RealtimeSender) {
        tracing::info!("Cleaning up...");
        self.bridge.reset();
        self.controller.shutdown().await;

        if let Err(e) = sender.close().await {
            tracing::debug!("Socket close: {}", e);
        }
        if let Some(out) = self.audio_out.take() {
            let written = out.bytes_written();
            if let Err(e) = out.finish().await {
                tracing::warn!("Failed to flush audio output: {}", e);
            } else {
                tracing::info!("Wrote {} bytes of response audio", written);
            }
        }
        tracing::info!("Cleanup complete");
    }
}

/// Mirror drone state broadcasts into the shared flight state.
pub fn spawn_telemetry_sync(
    mut telemetry: watch::Receiver<Option<TelloTelemetry>>,
    state: SharedFlightState,
) {
    tokio::spawn(async move {
        while telemetry.changed().await.is_ok() {
            let latest = telemetry.borrow_and_update().clone();
            let Some(packet) = latest else {
                continue;
            };
            let mut flight = state.lock().unwrap_or_else(PoisonError::into_inner);
            flight.set_battery(packet.battery as i64);
            if flight.is_flying {
                flight.set_height(packet.height_cm as i64);
            }
        }
        tracing::debug!("Telemetry sync stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tello_core::FlightState;

    #[tokio::test]
    async fn test_telemetry_sync_updates_state() {
        let (tx, rx) = watch::channel(None);
        let state = FlightState::shared();
        spawn_telemetry_sync(rx, state.clone());

        tx.send(Some(TelloTelemetry {
            battery: 64,
            height_cm: 120,
            ..Default::default()
        }))
        .unwrap();

        for _ in 0..50 {
            if state.lock().unwrap().battery == 64 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let snapshot = state.lock().unwrap().clone();
        assert_eq!(snapshot.battery, 64);
        // Grounded drones keep height zero.
        assert_eq!(snapshot.height_cm, 0);
    }
}
