use crate::config::SummaryConfig;
use crate::error::{check_status, PipelineError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Category used whenever the model gives none.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub summary: String,
    pub category: String,
    #[serde(default)]
    pub action_items: Vec<String>,
}

impl CallSummary {
    fn uncategorized(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            category: UNCATEGORIZED.to_string(),
            action_items: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    action_items: Vec<String>,
}

/// Summarizes transcripts through a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: reqwest::Client,
    config: SummaryConfig,
}

impl Summarizer {
    pub fn new(client: reqwest::Client, config: SummaryConfig) -> Self {
        Self { client, config }
    }

    pub async fn summarize(&self, transcript: &str) -> Result<CallSummary, PipelineError> {
        if transcript.trim().is_empty() {
            return Ok(CallSummary::uncategorized("No speech was captured on this call."));
        }

        let body = json!({
            "model": self.config.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": self.config.prompt },
                { "role": "user", "content": transcript },
            ],
        });
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let text = check_status("summary", response).await?.text().await?;
        let chat: ChatResponse = serde_json::from_str(&text)?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let summary = parse_summary(&content);
        debug!(category = %summary.category, "call summarized");
        Ok(summary)
    }
}

/// Reads the model's JSON reply. Anything that is not the expected object
/// is kept verbatim as the summary.
pub(crate) fn parse_summary(content: &str) -> CallSummary {
    match serde_json::from_str::<SummaryFields>(content) {
        Ok(fields) => {
            let category = fields.category.trim().to_lowercase();
            CallSummary {
                summary: fields.summary.trim().to_string(),
                category: if category.is_empty() {
                    UNCATEGORIZED.to_string()
                } else {
                    category
                },
                action_items: fields
                    .action_items
                    .into_iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            }
        }
        Err(e) => {
            warn!(error = %e, "summary reply was not the expected JSON object");
            CallSummary::uncategorized(content.trim())
        }
    }
}
