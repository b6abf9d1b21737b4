use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        REDACTED
    }
}

fn default_recording_format() -> String {
    "mp3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_report_ttl_secs() -> u64 {
    3600
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_summary_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_summary_prompt() -> String {
    "You summarize phone calls between a caller and an automated assistant. \
     Reply with a JSON object with the keys \"summary\" (two or three sentences), \
     \"category\" (one short lowercase label such as \"sales\", \"support\" or \
     \"billing\") and \"action_items\" (an array of short strings, possibly empty)."
        .to_string()
}

fn default_email_api_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}

fn default_subject_prefix() -> String {
    "Call summary".to_string()
}

fn default_telephony_api_host() -> String {
    "api.twilio.com".to_string()
}

/// Settings for post-call processing of recordings.
#[derive(Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Shared secret expected in the `token` query parameter of the
    /// recording webhook. Required when the pipeline is enabled.
    #[serde(default, skip_serializing)]
    pub webhook_secret: String,
    /// Extension requested from the recording host (`mp3` or `wav`).
    #[serde(default = "default_recording_format")]
    pub recording_format: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long finished reports stay retrievable.
    #[serde(default = "default_report_ttl_secs")]
    pub report_ttl_secs: u64,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_secret: String::new(),
            recording_format: default_recording_format(),
            request_timeout_secs: default_request_timeout_secs(),
            report_ttl_secs: default_report_ttl_secs(),
            transcription: TranscriptionConfig::default(),
            summary: SummaryConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("enabled", &self.enabled)
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("recording_format", &self.recording_format)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("report_ttl_secs", &self.report_ttl_secs)
            .field("transcription", &self.transcription)
            .field("summary", &self.summary)
            .field("email", &self.email)
            .finish()
    }
}

/// Speech-to-text endpoint (`{base_url}/audio/transcriptions`).
#[derive(Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    /// ISO-639-1 hint passed to the model.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            api_key: String::new(),
            model: default_transcription_model(),
            language: None,
        }
    }
}

impl fmt::Debug for TranscriptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("language", &self.language)
            .finish()
    }
}

/// Chat-completions endpoint used to summarize transcripts.
#[derive(Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_summary_model")]
    pub model: String,
    #[serde(default = "default_summary_prompt")]
    pub prompt: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            api_key: String::new(),
            model: default_summary_model(),
            prompt: default_summary_prompt(),
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Outbound mail (SendGrid v3 `mail/send` request shape).
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_email_api_url(),
            api_key: String::new(),
            from: String::new(),
            to: Vec::new(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject_prefix", &self.subject_prefix)
            .finish()
    }
}

impl EmailConfig {
    /// Mail is only sent when a key, a sender and at least one recipient exist.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.from.trim().is_empty() && !self.to.is_empty()
    }
}

/// Account credentials for fetching recordings from the telephony platform.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelephonyCredentials {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default, skip_serializing)]
    pub auth_token: String,
    /// Only recording URLs on this host (`host` or `host:port`) receive the
    /// credentials.
    #[serde(default = "default_telephony_api_host")]
    pub api_host: String,
}

impl Default for TelephonyCredentials {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            api_host: default_telephony_api_host(),
        }
    }
}

impl fmt::Debug for TelephonyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelephonyCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("api_host", &self.api_host)
            .finish()
    }
}
