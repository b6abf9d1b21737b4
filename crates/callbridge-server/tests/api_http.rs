use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use callbridge_pipeline::{CallReport, CallSummary};
use callbridge_server::config::Config;
use callbridge_server::{app, AppState};
use serde_json::Value;
use std::time::Instant;
use tower::ServiceExt;

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const COMPLETED_FORM: &str = "CallSid=CA1&RecordingSid=RE1&RecordingUrl=http%3A%2F%2F127.0.0.1%3A9%2FRecordings%2FRE1&RecordingStatus=completed";

fn pipeline_config(secret: &str) -> Config {
    let mut config = Config::default();
    config.pipeline.enabled = true;
    config.pipeline.webhook_secret = secret.to_string();
    config
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = app(AppState::from_config(&Config::default()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn incoming_call_uses_configured_public_host() {
    let mut config = Config::default();
    config.server.public_host = "calls.example.com".into();
    config.telephony.say = Some("Connecting you now.".into());
    let app = app(AppState::from_config(&config));

    let response = app
        .oneshot(form_request("/incoming-call", "CallSid=CA1&From=%2B15550001"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let twiml = body_string(response).await;
    assert!(twiml.contains("<Say>Connecting you now.</Say>"));
    assert!(twiml.contains(r#"<Stream url="wss://calls.example.com/media-stream"/>"#));
}

#[tokio::test]
async fn incoming_call_falls_back_to_host_header() {
    let app = app(AppState::from_config(&Config::default()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/incoming-call")
                .header(header::HOST, "abc123.ngrok.app")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let twiml = body_string(response).await;
    assert!(twiml.contains(r#"url="wss://abc123.ngrok.app/media-stream""#));
    assert!(!twiml.contains("<Say>"));
}

#[tokio::test]
async fn recording_webhook_rejects_bad_token() {
    let app = app(AppState::from_config(&pipeline_config("hook")));

    for uri in ["/recording-status", "/recording-status?token=wrong"] {
        let response = app
            .clone()
            .oneshot(form_request(uri, COMPLETED_FORM))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn recording_webhook_is_unavailable_when_pipeline_disabled() {
    let mut config = pipeline_config("hook");
    config.pipeline.enabled = false;
    let app = app(AppState::from_config(&config));

    let response = app
        .oneshot(form_request("/recording-status?token=hook", COMPLETED_FORM))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn enabled_pipeline_without_secret_rejects_every_webhook() {
    let state = AppState::from_config(&pipeline_config(""));
    assert!(state.pipeline.is_none());
    let app = app(state);

    let attacker_form = "CallSid=CA1&RecordingSid=RE1&RecordingUrl=http%3A%2F%2F127.0.0.1%3A9%2Fsteal%2Fx&RecordingStatus=completed";
    for uri in ["/recording-status", "/recording-status?token="] {
        let response = app
            .clone()
            .oneshot(form_request(uri, attacker_form))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn in_progress_recording_is_acknowledged_and_ignored() {
    let state = AppState::from_config(&pipeline_config("hook"));
    let app = app(state.clone());

    let response = app
        .oneshot(form_request(
            "/recording-status?token=hook",
            "CallSid=CA1&RecordingSid=RE1&RecordingUrl=x&RecordingStatus=in-progress",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ignored");
}

#[tokio::test]
async fn completed_recording_is_accepted() {
    let app = app(AppState::from_config(&pipeline_config("hook")));

    let response = app
        .oneshot(form_request("/recording-status?token=hook", COMPLETED_FORM))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn report_lookup() {
    let state = AppState::from_config(&Config::default());
    state.lock_reports().insert(
        "CA7".into(),
        CallReport {
            call_sid: "CA7".into(),
            recording_sid: "RE7".into(),
            transcript: "I need a refund".into(),
            summary: CallSummary {
                summary: "Refund request.".into(),
                category: "billing".into(),
                action_items: vec!["Issue refund".into()],
            },
            emailed: true,
            completed_at: chrono::Utc::now(),
        },
        Instant::now(),
    );
    let app: Router = app(state);

    let found = app
        .clone()
        .oneshot(Request::builder().uri("/calls/CA7/report").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(found).await).unwrap();
    assert_eq!(json["summary"]["category"], "billing");
    assert_eq!(json["transcript"], "I need a refund");

    let missing = app
        .oneshot(Request::builder().uri("/calls/CA404/report").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
