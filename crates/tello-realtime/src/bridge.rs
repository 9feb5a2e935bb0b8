//! Reacts to server events and decides what the session should do next.
//!
//! The bridge holds no I/O. The session feeds it events and carries out
//! the returned actions, which keeps the ordering rules testable.

use serde_json::Value;

use crate::gate::{GateState, Release, ResponseGate};
use crate::protocol::{ClientEvent, ServerEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeAction {
    /// Write this event to the socket.
    Send(ClientEvent),
    /// Decoded PCM16 audio for the speaker.
    PlayAudio(Vec<u8>),
    /// What the user said.
    Transcript(String),
    /// Run a tool and report back through [`SpeechBridge::tool_output`].
    CallTool {
        call_id: String,
        name: String,
        arguments: Value,
    },
}

#[derive(Debug, Default)]
pub struct SpeechBridge {
    gate: ResponseGate<String>,
}

impl SpeechBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn queued_speech(&self) -> usize {
        self.gate.pending_len()
    }

    pub fn handle(&mut self, event: ServerEvent) -> Vec<BridgeAction> {
        match event {
            ServerEvent::SessionCreated { .. } => {
                tracing::info!("Realtime session created");
                Vec::new()
            }
            ServerEvent::SessionUpdated { .. } => {
                tracing::debug!("Session configuration accepted");
                Vec::new()
            }
            ServerEvent::SpeechStarted { .. } => {
                tracing::info!("Speech detected - listening...");
                Vec::new()
            }
            ServerEvent::SpeechStopped { .. } => {
                tracing::info!("Speech ended - processing...");
                Vec::new()
            }
            ServerEvent::TranscriptionCompleted { transcript } => {
                tracing::info!("You said: {}", transcript.trim());
                vec![BridgeAction::Transcript(transcript)]
            }
            ServerEvent::ResponseCreated { .. } => {
                self.gate.on_created();
                Vec::new()
            }
            ServerEvent::ResponseDone { response } => {
                tracing::debug!("Response {} done ({:?})", response.id, response.status);
                match self.gate.on_done() {
                    Some(Release::Retry) => {
                        tracing::info!("Retrying response request");
                        vec![BridgeAction::Send(ClientEvent::ResponseCreate)]
                    }
                    Some(Release::Next(text)) => {
                        tracing::info!("Processing queued speech: {}", text);
                        speech_events(text)
                    }
                    None => Vec::new(),
                }
            }
            event @ ServerEvent::AudioDelta { .. } => match event.audio_bytes() {
                Some(pcm) => vec![BridgeAction::PlayAudio(pcm)],
                None => {
                    tracing::warn!("Dropping audio delta with invalid base64");
                    Vec::new()
                }
            },
            ServerEvent::AudioTranscriptDelta { .. } => Vec::new(),
            ServerEvent::AudioTranscriptDone { transcript } => {
                tracing::info!("Assistant: {}", transcript);
                Vec::new()
            }
            ServerEvent::FunctionCallArgumentsDelta { call_id, .. } => {
                tracing::trace!("Arguments streaming for call {}", call_id);
                Vec::new()
            }
            ServerEvent::FunctionCallArgumentsDone {
                call_id,
                name,
                arguments,
            } => {
                tracing::info!("Calling function: {}", name);
                match parse_arguments(&arguments) {
                    Ok(arguments) => vec![BridgeAction::CallTool {
                        call_id,
                        name,
                        arguments,
                    }],
                    Err(e) => {
                        let output = format!("Function {} error: invalid arguments: {}", name, e);
                        tracing::error!("{}", output);
                        self.tool_output(call_id, &name, output)
                    }
                }
            }
            ServerEvent::Error { error } => {
                tracing::error!(
                    "API Error: {} (code: {})",
                    error.message,
                    error.code.as_deref().unwrap_or("none")
                );
                if error.is_active_response() {
                    self.gate.on_rejected_busy();
                    return Vec::new();
                }
                match self.gate.on_error() {
                    Some(text) => speech_events(text),
                    None => Vec::new(),
                }
            }
            ServerEvent::Other => Vec::new(),
        }
    }

    /// Ask the model to say something, waiting for any active response.
    pub fn speak(&mut self, text: impl Into<String>) -> Vec<BridgeAction> {
        let text = text.into();
        match self.gate.request(text) {
            Some(text) => {
                tracing::info!("Speaking: {}", text);
                speech_events(text)
            }
            None => {
                tracing::info!("Queuing speech (response active)");
                Vec::new()
            }
        }
    }

    /// Report a tool result. The output item goes out immediately; the
    /// spoken confirmation waits its turn.
    pub fn tool_output(
        &mut self,
        call_id: impl Into<String>,
        name: &str,
        output: impl Into<String>,
    ) -> Vec<BridgeAction> {
        let output = output.into();
        let mut actions = vec![BridgeAction::Send(ClientEvent::function_output(
            call_id,
            output.clone(),
        ))];
        actions.extend(self.speak(format!(
            "Please confirm the result of {}: {}",
            name, output
        )));
        actions
    }

    pub fn reset(&mut self) {
        self.gate.reset();
    }
}

fn speech_events(text: String) -> Vec<BridgeAction> {
    vec![
        BridgeAction::Send(ClientEvent::user_text(text)),
        BridgeAction::Send(ClientEvent::ResponseCreate),
    ]
}

/// Empty argument strings are treated as `{}`.
fn parse_arguments(raw: &str) -> serde_json::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_json::from_str(raw)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("arguments must be a JSON object"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ApiError, ResponseInfo, ACTIVE_RESPONSE_CODE};
    use serde_json::json;

    fn created() -> ServerEvent {
        ServerEvent::ResponseCreated {
            response: ResponseInfo::default(),
        }
    }

    fn done() -> ServerEvent {
        ServerEvent::ResponseDone {
            response: ResponseInfo::default(),
        }
    }

    fn sent_texts(actions: &[BridgeAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|action| match action {
                BridgeAction::Send(event) => event.to_json().ok(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_speak_when_idle_sends_immediately() {
        let mut bridge = SpeechBridge::new();
        let actions = bridge.speak("hello");
        assert_eq!(
            actions,
            vec![
                BridgeAction::Send(ClientEvent::user_text("hello")),
                BridgeAction::Send(ClientEvent::ResponseCreate),
            ]
        );
        assert_eq!(bridge.gate_state(), GateState::Requested);
    }

    #[test]
    fn test_tool_call_flow_waits_for_response_done() {
        let mut bridge = SpeechBridge::new();
        assert!(bridge.handle(created()).is_empty());

        let actions = bridge.handle(ServerEvent::FunctionCallArgumentsDone {
            call_id: "call_7".into(),
            name: "move_forward".into(),
            arguments: r#"{"distance": 50}"#.into(),
        });
        assert_eq!(
            actions,
            vec![BridgeAction::CallTool {
                call_id: "call_7".into(),
                name: "move_forward".into(),
                arguments: json!({"distance": 50}),
            }]
        );

        let actions =
            bridge.tool_output("call_7", "move_forward", "Moved forward 50cm (Movement #1)");
        assert_eq!(
            actions,
            vec![BridgeAction::Send(ClientEvent::function_output(
                "call_7",
                "Moved forward 50cm (Movement #1)"
            ))]
        );
        assert_eq!(bridge.queued_speech(), 1);

        let actions = bridge.handle(done());
        assert_eq!(
            actions,
            vec![
                BridgeAction::Send(ClientEvent::user_text(
                    "Please confirm the result of move_forward: Moved forward 50cm (Movement #1)"
                )),
                BridgeAction::Send(ClientEvent::ResponseCreate),
            ]
        );
    }

    #[test]
    fn test_malformed_arguments_answer_with_error() {
        let mut bridge = SpeechBridge::new();
        let actions = bridge.handle(ServerEvent::FunctionCallArgumentsDone {
            call_id: "c".into(),
            name: "rotate_clockwise".into(),
            arguments: "{not json".into(),
        });

        let sent = sent_texts(&actions);
        assert_eq!(sent.len(), 3);
        assert!(sent[0].contains("function_call_output"));
        assert!(sent[0].contains("Function rotate_clockwise error: invalid arguments"));
        assert!(sent[2].contains("response.create"));
    }

    #[test]
    fn test_empty_arguments_are_an_empty_object() {
        let mut bridge = SpeechBridge::new();
        let actions = bridge.handle(ServerEvent::FunctionCallArgumentsDone {
            call_id: "c".into(),
            name: "takeoff".into(),
            arguments: String::new(),
        });
        assert_eq!(
            actions,
            vec![BridgeAction::CallTool {
                call_id: "c".into(),
                name: "takeoff".into(),
                arguments: json!({}),
            }]
        );
    }

    #[test]
    fn test_rejected_request_unblocks_queue() {
        let mut bridge = SpeechBridge::new();
        assert_eq!(bridge.speak("first").len(), 2);
        assert!(bridge.speak("second").is_empty());

        let actions = bridge.handle(ServerEvent::Error {
            error: ApiError {
                message: "Invalid modalities".into(),
                ..Default::default()
            },
        });
        assert_eq!(actions[0], BridgeAction::Send(ClientEvent::user_text("second")));
    }

    #[test]
    fn test_busy_rejection_is_retried_after_done() {
        let mut bridge = SpeechBridge::new();
        assert_eq!(bridge.speak("status please").len(), 2);
        // The server began answering voice input before it read our request.
        assert!(bridge.handle(created()).is_empty());
        let actions = bridge.handle(ServerEvent::Error {
            error: ApiError {
                code: Some(ACTIVE_RESPONSE_CODE.into()),
                message: "Conversation already has an active response".into(),
                ..Default::default()
            },
        });
        assert!(actions.is_empty());
        assert_eq!(bridge.gate_state(), GateState::Active);

        assert_eq!(
            bridge.handle(done()),
            vec![BridgeAction::Send(ClientEvent::ResponseCreate)]
        );
        assert_eq!(bridge.gate_state(), GateState::Requested);
    }

    #[test]
    fn test_audio_and_transcript() {
        let mut bridge = SpeechBridge::new();
        assert_eq!(
            bridge.handle(ServerEvent::AudioDelta { delta: "AAEC".into() }),
            vec![BridgeAction::PlayAudio(vec![0, 1, 2])]
        );
        assert!(bridge
            .handle(ServerEvent::AudioDelta { delta: "%%%".into() })
            .is_empty());
        assert_eq!(
            bridge.handle(ServerEvent::TranscriptionCompleted {
                transcript: "take off".into()
            }),
            vec![BridgeAction::Transcript("take off".into())]
        );
    }
}
