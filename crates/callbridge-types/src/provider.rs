//! Realtime speech provider protocol.
//!
//! Directives flow from the relay to the provider; events flow back. The
//! provider has shipped two names for the synthesized-audio event over its
//! protocol revisions (`response.audio.delta` carrying `delta`, and
//! `response.output_audio.delta` which some deployments send with an `audio`
//! field). Both spellings decode to [`ProviderEvent::AudioDelta`].

use serde::{Deserialize, Serialize};

/// Inbound event from the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderEvent {
    #[serde(rename = "session.created")]
    SessionCreated,
    #[serde(rename = "session.updated")]
    SessionUpdated,
    /// A chunk of synthesized audio for the response in progress.
    #[serde(
        rename = "response.audio.delta",
        alias = "response.output_audio.delta"
    )]
    AudioDelta {
        #[serde(default, alias = "audio")]
        delta: Option<String>,
        #[serde(default)]
        response_id: Option<String>,
    },
    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        response: Option<ResponseRef>,
    },
    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: Option<ResponseRef>,
    },
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: Option<u64>,
    },
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: Option<u64>,
    },
    /// Application-level error. The connection stays usable.
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: Option<ProviderErrorDetail>,
    },
    #[serde(other)]
    Unknown,
}

impl ProviderEvent {
    /// Decodes a text frame. Malformed or untagged JSON yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Identifies the response an event belongs to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of a provider `error` event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderErrorDetail {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
}

/// Outbound directive to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ProviderDirective {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionSettings },
    #[serde(rename = "response.create")]
    ResponseCreate {
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseOptions>,
    },
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioAppend { audio: String },
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioCommit,
    #[serde(rename = "response.cancel")]
    ResponseCancel,
}

impl ProviderDirective {
    /// Wire name of the directive, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::ResponseCreate { .. } => "response.create",
            Self::InputAudioAppend { .. } => "input_audio_buffer.append",
            Self::InputAudioCommit => "input_audio_buffer.commit",
            Self::ResponseCancel => "response.cancel",
        }
    }
}

/// Session configuration pushed once after the provider handshake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSettings {
    pub modalities: Vec<String>,
    pub instructions: String,
    pub voice: String,
    pub input_audio_format: String,
    pub output_audio_format: String,
    /// `None` serializes as `null`, which disables provider-side turn detection.
    pub turn_detection: Option<TurnDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Provider-side voice activity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,
    /// Whether the provider may start a response on its own when speech stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_response: Option<bool>,
    /// Whether the provider may cancel a response on its own on barge-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_response: Option<bool>,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: None,
            prefix_padding_ms: None,
            silence_duration_ms: None,
            create_response: Some(false),
            interrupt_response: Some(false),
        }
    }
}

/// Per-response overrides for `response.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_audio_delta_spellings_decode() {
        let legacy = r#"{"type":"response.audio.delta","response_id":"r1","delta":"AAA="}"#;
        let current = r#"{"type":"response.output_audio.delta","audio":"BBB="}"#;

        assert_eq!(
            ProviderEvent::parse(legacy),
            Some(ProviderEvent::AudioDelta {
                delta: Some("AAA=".into()),
                response_id: Some("r1".into()),
            })
        );
        assert_eq!(
            ProviderEvent::parse(current),
            Some(ProviderEvent::AudioDelta {
                delta: Some("BBB=".into()),
                response_id: None,
            })
        );
    }

    #[test]
    fn lifecycle_and_vad_events_decode() {
        let created = r#"{"type":"response.created","event_id":"e1","response":{"id":"r1","status":"in_progress"}}"#;
        match ProviderEvent::parse(created) {
            Some(ProviderEvent::ResponseCreated { response: Some(r) }) => {
                assert_eq!(r.id.as_deref(), Some("r1"))
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            ProviderEvent::parse(r#"{"type":"response.done","response":{"status":"cancelled"}}"#),
            Some(ProviderEvent::ResponseDone { .. })
        ));
        assert!(matches!(
            ProviderEvent::parse(
                r#"{"type":"input_audio_buffer.speech_started","audio_start_ms":120,"item_id":"i1"}"#
            ),
            Some(ProviderEvent::SpeechStarted {
                audio_start_ms: Some(120)
            })
        ));
        assert!(matches!(
            ProviderEvent::parse(r#"{"type":"input_audio_buffer.speech_stopped"}"#),
            Some(ProviderEvent::SpeechStopped { .. })
        ));
    }

    #[test]
    fn error_event_keeps_detail() {
        let text = r#"{"type":"error","error":{"type":"invalid_request_error","code":"input_audio_buffer_commit_empty","message":"buffer too small"}}"#;
        match ProviderEvent::parse(text) {
            Some(ProviderEvent::Error { error: Some(e) }) => {
                assert_eq!(e.kind.as_deref(), Some("invalid_request_error"));
                assert_eq!(e.code.as_deref(), Some("input_audio_buffer_commit_empty"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unrecognized_and_malformed_messages() {
        assert_eq!(
            ProviderEvent::parse(r#"{"type":"rate_limits.updated","rate_limits":[]}"#),
            Some(ProviderEvent::Unknown)
        );
        assert_eq!(ProviderEvent::parse("{"), None);
    }

    #[test]
    fn directives_serialize_with_type_tag() {
        assert_eq!(
            serde_json::to_value(ProviderDirective::InputAudioCommit).unwrap(),
            json!({ "type": "input_audio_buffer.commit" })
        );
        assert_eq!(
            serde_json::to_value(ProviderDirective::ResponseCreate { response: None }).unwrap(),
            json!({ "type": "response.create" })
        );
        assert_eq!(
            serde_json::to_value(ProviderDirective::InputAudioAppend {
                audio: "fw==".into()
            })
            .unwrap(),
            json!({ "type": "input_audio_buffer.append", "audio": "fw==" })
        );
    }

    #[test]
    fn session_update_carries_formats_and_turn_detection() {
        let directive = ProviderDirective::SessionUpdate {
            session: SessionSettings {
                modalities: vec!["text".into(), "audio".into()],
                instructions: "be brief".into(),
                voice: "alloy".into(),
                input_audio_format: crate::G711_ULAW.into(),
                output_audio_format: crate::G711_ULAW.into(),
                turn_detection: Some(TurnDetection::default()),
                temperature: None,
            },
        };
        let value = serde_json::to_value(&directive).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["input_audio_format"], "g711_ulaw");
        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");
        assert_eq!(value["session"]["turn_detection"]["create_response"], false);
        assert!(value["session"].get("temperature").is_none());
    }
}
