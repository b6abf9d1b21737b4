//! Recording webhook and report retrieval.

use crate::AppState;
use axum::{
    extract::{Extension, Form, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use callbridge_pipeline::{CallReport, RecordingJob};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Recording status reported by the platform once the media is available.
const COMPLETED: &str = "completed";

#[derive(Debug, Deserialize)]
pub struct WebhookParams {
    pub token: Option<String>,
}

/// Recording status callback body (form encoded).
#[derive(Debug, Deserialize)]
pub struct RecordingStatusForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "RecordingSid", default)]
    pub recording_sid: String,
    #[serde(rename = "RecordingUrl", default)]
    pub recording_url: String,
    #[serde(rename = "RecordingStatus", default)]
    pub recording_status: String,
}

/// Constant-time token check. An unset secret matches nothing.
fn secret_matches(expected: &str, provided: Option<&str>) -> bool {
    if expected.trim().is_empty() {
        return false;
    }
    let Some(provided) = provided else {
        return false;
    };
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn recording_status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WebhookParams>,
    Form(form): Form<RecordingStatusForm>,
) -> Response {
    if !secret_matches(&state.webhook_secret, params.token.as_deref()) {
        tracing::warn!(call_sid = %form.call_sid, "recording webhook rejected: bad token");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let Some(pipeline) = state.pipeline.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "recording pipeline is disabled" })),
        )
            .into_response();
    };

    if form.recording_status != COMPLETED {
        tracing::debug!(
            call_sid = %form.call_sid,
            status = %form.recording_status,
            "ignoring recording status"
        );
        return (StatusCode::OK, Json(json!({ "status": "ignored" }))).into_response();
    }

    if form.recording_url.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "RecordingUrl is required" })),
        )
            .into_response();
    }

    let job = RecordingJob {
        call_sid: form.call_sid,
        recording_sid: form.recording_sid,
        recording_url: form.recording_url,
    };
    tracing::info!(call_sid = %job.call_sid, recording_sid = %job.recording_sid, "recording accepted");

    let state_clone = state.clone();
    tokio::spawn(async move {
        match pipeline.process(&job).await {
            Ok(report) => {
                state_clone
                    .lock_reports()
                    .insert(report.call_sid.clone(), report, Instant::now());
            }
            Err(e) => {
                tracing::error!(call_sid = %job.call_sid, "recording processing failed: {}", e);
            }
        }
    });

    (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))).into_response()
}

pub async fn get_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(call_sid): Path<String>,
) -> Result<Json<CallReport>, StatusCode> {
    state
        .lock_reports()
        .get(&call_sid, Instant::now())
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
