//! Server configuration loading from file and environment variables.

use callbridge_pipeline::{PipelineConfig, TelephonyCredentials};
use callbridge_relay::{ProviderConfig, RelayConfig};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Realtime speech provider connection and session settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Turn-taking and buffering.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Telephony account and call-answer settings.
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Post-call recording processing.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable `host[:port]` used in the media-stream URL handed
    /// to the telephony platform. When empty, the request's `Host` header is
    /// used instead.
    #[serde(default)]
    pub public_host: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "callbridge_relay=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Telephony account settings.
#[derive(Clone, Deserialize)]
pub struct TelephonyConfig {
    #[serde(default)]
    pub account_sid: String,

    #[serde(default)]
    pub auth_token: String,

    /// Host that serves recordings. The account credentials are sent nowhere
    /// else.
    #[serde(default = "default_telephony_api_host")]
    pub api_host: String,

    /// Spoken by the telephony platform before the media stream connects.
    #[serde(default)]
    pub say: Option<String>,
}

impl fmt::Debug for TelephonyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelephonyConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("api_host", &self.api_host)
            .field("say", &self.say)
            .finish()
    }
}

impl TelephonyConfig {
    pub fn credentials(&self) -> TelephonyCredentials {
        TelephonyCredentials {
            account_sid: self.account_sid.clone(),
            auth_token: self.auth_token.clone(),
            api_host: self.api_host.clone(),
        }
    }
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            api_host: default_telephony_api_host(),
            say: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5050
}

fn default_telephony_api_host() -> String {
    TelephonyCredentials::default().api_host
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_host: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CALLBRIDGE_HOST` overrides `server.host`
/// - `CALLBRIDGE_PORT` overrides `server.port`
/// - `CALLBRIDGE_PUBLIC_HOST` overrides `server.public_host`
/// - `CALLBRIDGE_LOG_LEVEL` overrides `logging.level`
/// - `CALLBRIDGE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OPENAI_API_KEY` sets the provider, transcription and summary keys
/// - `CALLBRIDGE_PROVIDER_URL` overrides `provider.url`
/// - `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` override the telephony account
/// - `CALLBRIDGE_WEBHOOK_SECRET` overrides `pipeline.webhook_secret`
/// - `SENDGRID_API_KEY` overrides `pipeline.email.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies environment-style overrides read through `var`.
pub fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("CALLBRIDGE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("CALLBRIDGE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(public_host) = var("CALLBRIDGE_PUBLIC_HOST") {
        config.server.public_host = public_host;
    }
    if let Some(level) = var("CALLBRIDGE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("CALLBRIDGE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(key) = var("OPENAI_API_KEY") {
        config.provider.api_key = key.clone();
        config.pipeline.transcription.api_key = key.clone();
        config.pipeline.summary.api_key = key;
    }
    if let Some(url) = var("CALLBRIDGE_PROVIDER_URL") {
        config.provider.url = url;
    }
    if let Some(sid) = var("TWILIO_ACCOUNT_SID") {
        config.telephony.account_sid = sid;
    }
    if let Some(token) = var("TWILIO_AUTH_TOKEN") {
        config.telephony.auth_token = token;
    }
    if let Some(secret) = var("CALLBRIDGE_WEBHOOK_SECRET") {
        config.pipeline.webhook_secret = secret;
    }
    if let Some(key) = var("SENDGRID_API_KEY") {
        config.pipeline.email.api_key = key;
    }
}
