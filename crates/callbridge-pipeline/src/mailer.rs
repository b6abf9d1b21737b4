use crate::config::EmailConfig;
use crate::error::{check_status, PipelineError};
use crate::pipeline::CallReport;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Delivers call reports by email through a SendGrid-compatible API.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: EmailConfig,
}

impl Mailer {
    pub fn new(client: reqwest::Client, config: EmailConfig) -> Self {
        Self { client, config }
    }

    /// Sends the report. Returns `Ok(false)` without any request when mail is
    /// not configured.
    pub async fn send(&self, report: &CallReport) -> Result<bool, PipelineError> {
        if !self.config.is_configured() {
            debug!(call_sid = %report.call_sid, "email not configured, skipping");
            return Ok(false);
        }

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.message(report))
            .send()
            .await?;
        check_status("email", response).await?;

        info!(
            call_sid = %report.call_sid,
            recipients = self.config.to.len(),
            "call report emailed"
        );
        Ok(true)
    }

    pub(crate) fn message(&self, report: &CallReport) -> Value {
        let to: Vec<Value> = self
            .config
            .to
            .iter()
            .map(|address| json!({ "email": address }))
            .collect();

        let mut body = format!(
            "Call: {}\nCategory: {}\nCompleted: {}\n\n{}\n",
            report.call_sid,
            report.summary.category,
            report.completed_at.to_rfc3339(),
            report.summary.summary
        );
        if !report.summary.action_items.is_empty() {
            body.push_str("\nAction items:\n");
            for item in &report.summary.action_items {
                body.push_str("- ");
                body.push_str(item);
                body.push('\n');
            }
        }

        json!({
            "personalizations": [{ "to": to }],
            "from": { "email": self.config.from },
            "subject": format!(
                "{} [{}] {}",
                self.config.subject_prefix, report.summary.category, report.call_sid
            ),
            "content": [{ "type": "text/plain", "value": body }],
            "attachments": [{
                "content": STANDARD.encode(report.transcript.as_bytes()),
                "filename": format!("transcript-{}.txt", report.call_sid),
                "type": "text/plain",
                "disposition": "attachment",
            }],
        })
    }
}
