//! Realtime API wire events.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
pub const AUDIO_FORMAT: &str = "pcm16";
pub const CHUNK_FRAMES: usize = 1024;
/// One chunk of 16-bit mono samples.
pub const CHUNK_BYTES: usize = CHUNK_FRAMES * 2 * CHANNELS as usize;

pub const DEFAULT_VOICE: &str = "alloy";
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

// ============================================================================
// Session configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    pub threshold: f64,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 500,
        }
    }
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            kind: "function".to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub modalities: Vec<String>,
    pub instructions: String,
    pub voice: String,
    pub input_audio_format: String,
    pub output_audio_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<TranscriptionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: String,
    pub temperature: f64,
    pub max_response_output_tokens: u32,
}

impl SessionConfig {
    pub fn new(instructions: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            modalities: vec!["text".to_string(), "audio".to_string()],
            instructions: instructions.into(),
            voice: DEFAULT_VOICE.to_string(),
            input_audio_format: AUDIO_FORMAT.to_string(),
            output_audio_format: AUDIO_FORMAT.to_string(),
            input_audio_transcription: Some(TranscriptionConfig {
                model: TRANSCRIPTION_MODEL.to_string(),
            }),
            turn_detection: Some(TurnDetection::default()),
            tools,
            tool_choice: "auto".to_string(),
            temperature: 0.7,
            max_response_output_tokens: 4096,
        }
    }
}

// ============================================================================
// Client events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    Message {
        role: String,
        content: Vec<ContentPart>,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: Box<SessionConfig> },
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    pub fn session_update(session: SessionConfig) -> Self {
        ClientEvent::SessionUpdate {
            session: Box::new(session),
        }
    }

    /// Base64-encode a PCM16 chunk for the input buffer.
    pub fn append_audio(pcm: &[u8]) -> Self {
        ClientEvent::InputAudioBufferAppend {
            audio: STANDARD.encode(pcm),
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem::Message {
                role: "user".to_string(),
                content: vec![ContentPart::InputText { text: text.into() }],
            },
        }
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: call_id.into(),
                output: output.into(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Server events
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Error code for a `response.create` sent while another response runs.
pub const ACTIVE_RESPONSE_CODE: &str = "conversation_already_has_active_response";

impl ApiError {
    pub fn is_active_response(&self) -> bool {
        self.code.as_deref() == Some(ACTIVE_RESPONSE_CODE)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        session: Value,
    },
    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: Value,
    },
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: u64,
    },
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: u64,
    },
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        #[serde(default)]
        transcript: String,
    },
    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        response: ResponseInfo,
    },
    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: ResponseInfo,
    },
    #[serde(rename = "response.audio.delta")]
    AudioDelta { delta: String },
    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta { delta: String },
    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        #[serde(default)]
        transcript: String,
    },
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        #[serde(default)]
        call_id: String,
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(rename = "error")]
    Error { error: ApiError },
    /// Any event type this crate does not act on.
    #[serde(other)]
    Other,
}

impl ServerEvent {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Decode the PCM16 payload of an audio delta.
    pub fn audio_bytes(&self) -> Option<Vec<u8>> {
        match self {
            ServerEvent::AudioDelta { delta } => STANDARD.decode(delta).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_update_shape() {
        let event = ClientEvent::session_update(SessionConfig::new("fly", vec![]));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["voice"], "alloy");
        assert_eq!(value["session"]["input_audio_format"], "pcm16");
        assert_eq!(value["session"]["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");
        assert_eq!(value["session"]["turn_detection"]["silence_duration_ms"], 500);
        assert_eq!(value["session"]["tool_choice"], "auto");
        assert_eq!(value["session"]["max_response_output_tokens"], 4096);
    }

    #[test]
    fn test_client_event_shapes() {
        assert_eq!(
            serde_json::to_value(ClientEvent::ResponseCreate).unwrap(),
            json!({"type": "response.create"})
        );
        assert_eq!(
            serde_json::to_value(ClientEvent::user_text("hello")).unwrap(),
            json!({
                "type": "conversation.item.create",
                "item": {
                    "type": "message",
                    "role": "user",
                    "content": [{"type": "input_text", "text": "hello"}]
                }
            })
        );
        assert_eq!(
            serde_json::to_value(ClientEvent::function_output("call_1", "ok")).unwrap(),
            json!({
                "type": "conversation.item.create",
                "item": {"type": "function_call_output", "call_id": "call_1", "output": "ok"}
            })
        );
        assert_eq!(
            serde_json::to_value(ClientEvent::append_audio(&[0, 1, 2])).unwrap(),
            json!({"type": "input_audio_buffer.append", "audio": "AAEC"})
        );
    }

    #[test]
    fn test_server_event_parsing() {
        let done = ServerEvent::from_json(
            r#"{"type":"response.function_call_arguments.done","event_id":"e1","call_id":"c1","name":"takeoff","arguments":"{}"}"#,
        )
        .unwrap();
        assert_eq!(
            done,
            ServerEvent::FunctionCallArgumentsDone {
                call_id: "c1".into(),
                name: "takeoff".into(),
                arguments: "{}".into(),
            }
        );

        let audio =
            ServerEvent::from_json(r#"{"type":"response.audio.delta","delta":"AAEC"}"#).unwrap();
        assert_eq!(audio.audio_bytes(), Some(vec![0, 1, 2]));

        let other =
            ServerEvent::from_json(r#"{"type":"rate_limits.updated","rate_limits":[]}"#).unwrap();
        assert_eq!(other, ServerEvent::Other);

        let error = ServerEvent::from_json(
            r#"{"type":"error","error":{"type":"invalid_request_error","code":"conversation_already_has_active_response","message":"busy"}}"#,
        )
        .unwrap();
        match error {
            ServerEvent::Error { error } => {
                assert_eq!(error.message, "busy");
                assert!(error.is_active_response());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
