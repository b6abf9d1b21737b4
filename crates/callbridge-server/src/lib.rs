//! Callbridge server library logic.
//!
//! Answers inbound calls with TwiML that opens a bidirectional media stream,
//! bridges each stream to the realtime speech provider, and accepts
//! recording webhooks for post-call processing.

pub mod api_media;
pub mod api_recording;
pub mod api_twiml;
pub mod background;
pub mod config;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Extension, Json, Router};
use callbridge_pipeline::{CallReport, ExpiringCache, PipelineError, RecordingPipeline};
use callbridge_relay::{ProviderConfig, RelayConfig};
use crate::config::Config;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KiB). Webhooks are small form posts.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Finished call reports keyed by call SID.
pub type ReportCache = ExpiringCache<String, CallReport>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Speech provider settings shared by every call.
    pub provider: Arc<ProviderConfig>,
    /// Turn-taking and buffer settings shared by every call.
    pub relay: Arc<RelayConfig>,
    /// Host placed in the TwiML stream URL. `None` uses the request `Host`.
    pub public_host: Option<String>,
    /// Optional `<Say>` text before the stream connects.
    pub say: Option<String>,
    /// Recording webhook secret. Empty rejects every webhook.
    pub webhook_secret: String,
    /// Recording pipeline, `None` when disabled.
    pub pipeline: Option<Arc<RecordingPipeline>>,
    /// Recently finished call reports.
    ///
    /// Uses `std::sync::Mutex`: every access is a short map operation that
    /// never spans an `.await`.
    pub reports: Arc<Mutex<ReportCache>>,
    /// Media streams currently being bridged.
    pub active_calls: Arc<AtomicUsize>,
}

impl AppState {
    /// Builds the state from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let pipeline = match RecordingPipeline::new(&config.pipeline, config.telephony.credentials())
        {
            Ok(pipeline) => Some(Arc::new(pipeline)),
            Err(PipelineError::Disabled) => {
                tracing::info!("recording pipeline disabled");
                None
            }
            Err(PipelineError::MissingWebhookSecret) => {
                tracing::error!(
                    "recording pipeline enabled without pipeline.webhook_secret, refusing to start it"
                );
                None
            }
            Err(e) => {
                tracing::error!("failed to build recording pipeline: {}", e);
                None
            }
        };

        let public_host = Some(config.server.public_host.trim().to_string())
            .filter(|host| !host.is_empty());

        Self {
            provider: Arc::new(config.provider.clone()),
            relay: Arc::new(config.relay.clone()),
            public_host,
            say: config.telephony.say.clone(),
            webhook_secret: config.pipeline.webhook_secret.clone(),
            pipeline,
            reports: Arc::new(Mutex::new(ReportCache::new(Duration::from_secs(
                config.pipeline.report_ttl_secs,
            )))),
            active_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn active_call_count(&self) -> usize {
        self.active_calls.load(Ordering::Relaxed)
    }

    /// Locks the report cache, recovering from a poisoned lock.
    pub fn lock_reports(&self) -> MutexGuard<'_, ReportCache> {
        match self.reports.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("report cache lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/incoming-call",
            get(api_twiml::incoming_call_handler).post(api_twiml::incoming_call_handler),
        )
        .route("/media-stream", get(api_media::media_stream_handler))
        .route(
            "/recording-status",
            post(api_recording::recording_status_handler),
        )
        .route(
            "/calls/{call_sid}/report",
            get(api_recording::get_report_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
