use callbridge_types::{ResponseOptions, SessionSettings, TurnDetection, G711_ULAW};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_provider_url() -> String {
    "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_instructions() -> String {
    "You are a friendly phone assistant. Keep answers short and conversational, \
     speak naturally, and ask one question at a time."
        .to_string()
}

fn default_audio_format() -> String {
    G711_ULAW.to_string()
}

fn default_beta_header() -> Option<String> {
    Some("realtime=v1".to_string())
}

fn default_turn_detection() -> Option<TurnDetection> {
    Some(TurnDetection::default())
}

/// Connection and session settings for the realtime speech provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// WebSocket endpoint, including the model query parameter.
    #[serde(default = "default_provider_url")]
    pub url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// System prompt pushed in `session.update`.
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// Instructions for the opening response. When unset the provider greets
    /// using the session instructions alone.
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[serde(default = "default_turn_detection")]
    pub turn_detection: Option<TurnDetection>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Value of the `OpenAI-Beta` header; unset to omit the header.
    #[serde(default = "default_beta_header")]
    pub beta_header: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: default_provider_url(),
            api_key: String::new(),
            voice: default_voice(),
            instructions: default_instructions(),
            greeting: None,
            audio_format: default_audio_format(),
            turn_detection: default_turn_detection(),
            temperature: None,
            beta_header: default_beta_header(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("voice", &self.voice)
            .field("greeting", &self.greeting)
            .field("audio_format", &self.audio_format)
            .field("turn_detection", &self.turn_detection)
            .field("temperature", &self.temperature)
            .field("beta_header", &self.beta_header)
            .finish()
    }
}

impl ProviderConfig {
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Builds the `session.update` payload.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            modalities: vec!["text".to_string(), "audio".to_string()],
            instructions: self.instructions.clone(),
            voice: self.voice.clone(),
            input_audio_format: self.audio_format.clone(),
            output_audio_format: self.audio_format.clone(),
            turn_detection: self.turn_detection.clone(),
            temperature: self.temperature,
        }
    }

    /// Options for the greeting `response.create`.
    pub fn greeting_options(&self) -> Option<ResponseOptions> {
        self.greeting.as_ref().map(|greeting| ResponseOptions {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: Some(greeting.clone()),
        })
    }
}

/// Turn-taking thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Duration credited per inbound caller frame.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,
    /// Minimum buffered caller audio before a commit is sent.
    #[serde(default = "default_min_commit_ms")]
    pub min_commit_ms: u32,
    /// Speech-stopped events closer together than this are treated as duplicates.
    #[serde(default = "default_speech_stop_debounce_ms")]
    pub speech_stop_debounce_ms: u64,
    /// Cancel an in-progress response whenever caller audio arrives, not only
    /// on a provider speech-started event.
    #[serde(default = "default_true")]
    pub barge_in_on_media: bool,
    /// Ask the telephony peer to flush its playback buffer on barge-in.
    #[serde(default = "default_true")]
    pub clear_on_barge_in: bool,
}

fn default_frame_ms() -> u32 {
    20
}

fn default_min_commit_ms() -> u32 {
    100
}

fn default_speech_stop_debounce_ms() -> u64 {
    400
}

fn default_true() -> bool {
    true
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            min_commit_ms: default_min_commit_ms(),
            speech_stop_debounce_ms: default_speech_stop_debounce_ms(),
            barge_in_on_media: true,
            clear_on_barge_in: true,
        }
    }
}

/// Capacities of the per-call frame buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Caller frames held until the provider is ready.
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
    /// Synthesized frames held until the stream identity is known.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

fn default_inbound_capacity() -> usize {
    200
}

fn default_outbound_capacity() -> usize {
    300
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: default_inbound_capacity(),
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

/// Per-call relay settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default)]
    pub buffers: BufferConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_api_key() {
        let config = ProviderConfig {
            api_key: "sk-secret".to_string(),
            ..ProviderConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [turn]
            min_commit_ms = 160

            [buffers]
            outbound_capacity = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.turn.min_commit_ms, 160);
        assert_eq!(config.turn.frame_ms, 20);
        assert_eq!(config.turn.speech_stop_debounce_ms, 400);
        assert!(config.turn.barge_in_on_media);
        assert_eq!(config.buffers.inbound_capacity, 200);
        assert_eq!(config.buffers.outbound_capacity, 50);
    }

    #[test]
    fn greeting_options_only_when_configured() {
        let mut config = ProviderConfig::default();
        assert!(config.greeting_options().is_none());

        config.greeting = Some("Say hello".to_string());
        let options = config.greeting_options().unwrap();
        assert_eq!(options.instructions.as_deref(), Some("Say hello"));
    }

    #[test]
    fn session_settings_use_same_format_both_ways() {
        let settings = ProviderConfig::default().session_settings();
        assert_eq!(settings.input_audio_format, "g711_ulaw");
        assert_eq!(settings.output_audio_format, "g711_ulaw");
        assert_eq!(settings.voice, "alloy");
    }
}
