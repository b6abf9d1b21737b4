use crate::config::TranscriptionConfig;
use crate::error::{check_status, PipelineError};
use crate::recording::mime_for;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Speech-to-text over an OpenAI-compatible `/audio/transcriptions` endpoint.
#[derive(Debug, Clone)]
pub struct Transcriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl Transcriber {
    pub fn new(client: reqwest::Client, config: TranscriptionConfig) -> Self {
        Self { client, config }
    }

    /// Uploads the audio as a multipart form and returns the transcript text.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        format: &str,
    ) -> Result<String, PipelineError> {
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime_for(format))?;
        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let url = format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = check_status("transcription", response).await?.text().await?;
        let parsed: TranscriptionResponse = serde_json::from_str(&body)?;

        debug!(chars = parsed.text.len(), "recording transcribed");
        Ok(parsed.text.trim().to_string())
    }
}
