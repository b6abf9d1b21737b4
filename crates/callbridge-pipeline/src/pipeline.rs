use crate::config::{PipelineConfig, TelephonyCredentials};
use crate::error::PipelineError;
use crate::mailer::Mailer;
use crate::recording::RecordingFetcher;
use crate::summary::{CallSummary, Summarizer};
use crate::transcribe::Transcriber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// A completed recording announced by the telephony platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingJob {
    pub call_sid: String,
    pub recording_sid: String,
    pub recording_url: String,
}

/// Result of processing one call recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallReport {
    pub call_sid: String,
    pub recording_sid: String,
    pub transcript: String,
    pub summary: CallSummary,
    pub emailed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Download, transcribe, summarize, mail.
#[derive(Debug, Clone)]
pub struct RecordingPipeline {
    recordings: RecordingFetcher,
    transcriber: Transcriber,
    summarizer: Summarizer,
    mailer: Mailer,
}

impl RecordingPipeline {
    /// Builds the pipeline and its shared HTTP client.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Disabled`] when `config.enabled` is false,
    /// [`PipelineError::MissingWebhookSecret`] when no webhook secret is set,
    /// or [`PipelineError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &PipelineConfig,
        credentials: TelephonyCredentials,
    ) -> Result<Self, PipelineError> {
        if !config.enabled {
            return Err(PipelineError::Disabled);
        }
        if config.webhook_secret.trim().is_empty() {
            return Err(PipelineError::MissingWebhookSecret);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("callbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            recordings: RecordingFetcher::new(
                client.clone(),
                credentials,
                config.recording_format.clone(),
            ),
            transcriber: Transcriber::new(client.clone(), config.transcription.clone()),
            summarizer: Summarizer::new(client.clone(), config.summary.clone()),
            mailer: Mailer::new(client, config.email.clone()),
        })
    }

    /// Runs every stage for one recording.
    ///
    /// A failed download, transcription or summary aborts the job. A failed
    /// email does not: the report is still returned with `emailed = false`.
    pub async fn process(&self, job: &RecordingJob) -> Result<CallReport, PipelineError> {
        info!(
            call_sid = %job.call_sid,
            recording_sid = %job.recording_sid,
            "processing call recording"
        );

        let audio = self.recordings.download(&job.recording_url).await?;
        let format = self.recordings.format();
        let file_name = format!("{}.{}", job.recording_sid, format);
        let transcript = self
            .transcriber
            .transcribe(audio, &file_name, format)
            .await?;
        let summary = self.summarizer.summarize(&transcript).await?;

        let mut report = CallReport {
            call_sid: job.call_sid.clone(),
            recording_sid: job.recording_sid.clone(),
            transcript,
            summary,
            emailed: false,
            completed_at: Utc::now(),
        };

        report.emailed = match self.mailer.send(&report).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(call_sid = %job.call_sid, error = %e, "failed to email call report");
                false
            }
        };

        info!(
            call_sid = %report.call_sid,
            category = %report.summary.category,
            emailed = report.emailed,
            "call recording processed"
        );
        Ok(report)
    }
}
