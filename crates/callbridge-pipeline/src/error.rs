use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{stage} request returned {status}: {body}")]
    Status {
        stage: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("recording pipeline is disabled")]
    Disabled,

    #[error("recording pipeline requires a webhook secret")]
    MissingWebhookSecret,
}

/// Longest error body kept in [`PipelineError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Turns a non-2xx response into [`PipelineError::Status`], passing
/// successful responses through.
pub(crate) async fn check_status(
    stage: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, PipelineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(PipelineError::Status {
        stage,
        status: status.as_u16(),
        body,
    })
}
