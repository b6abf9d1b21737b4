use crate::config::TelephonyCredentials;
use crate::error::{check_status, PipelineError};
use tracing::{debug, warn};

/// Downloads call recordings from the telephony platform.
#[derive(Debug, Clone)]
pub struct RecordingFetcher {
    client: reqwest::Client,
    credentials: TelephonyCredentials,
    format: String,
}

impl RecordingFetcher {
    pub fn new(
        client: reqwest::Client,
        credentials: TelephonyCredentials,
        format: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Fetches the recording media. The account credentials are attached
    /// only when the URL points at the configured telephony API host.
    pub async fn download(&self, recording_url: &str) -> Result<Vec<u8>, PipelineError> {
        let url = media_url(recording_url, &self.format);
        let mut request = self.client.get(&url);
        if !self.credentials.account_sid.is_empty() {
            if is_trusted_host(&url, &self.credentials.api_host) {
                request = request.basic_auth(
                    &self.credentials.account_sid,
                    Some(&self.credentials.auth_token),
                );
            } else {
                warn!(
                    url = %url,
                    "recording host is not the telephony API host, sending no credentials"
                );
            }
        }

        let response = check_status("recording download", request.send().await?).await?;
        let audio = response.bytes().await?;
        debug!(url = %url, bytes = audio.len(), "recording downloaded");
        Ok(audio.to_vec())
    }
}

/// The recording resource URL has no extension; the extension selects the
/// media format.
pub(crate) fn media_url(recording_url: &str, format: &str) -> String {
    let trimmed = recording_url.trim_end_matches('/');
    let suffix = format!(".{}", format);
    if trimmed.ends_with(&suffix) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, suffix)
    }
}

/// True when `url` is served from `api_host`. A host without a port matches
/// any port; `host:port` must match both.
pub(crate) fn is_trusted_host(url: &str, api_host: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let api_host = api_host.trim();
    if api_host.is_empty() {
        return false;
    }
    match api_host.rsplit_once(':') {
        Some((name, port)) if port.parse::<u16>().is_ok() => {
            host.eq_ignore_ascii_case(name)
                && parsed.port_or_known_default() == port.parse::<u16>().ok()
        }
        _ => host.eq_ignore_ascii_case(api_host),
    }
}

/// MIME type sent along with the audio upload.
pub(crate) fn mime_for(format: &str) -> &'static str {
    match format {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
