use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use callbridge_server::config::Config;
use callbridge_server::{app, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

async fn spawn_upstreams() -> SocketAddr {
    let router = Router::new()
        .route("/Recordings/{file}", get(|| async { vec![1u8, 2, 3, 4] }))
        .route(
            "/v1/audio/transcriptions",
            post(|| async { Json(json!({ "text": "I would like to book a table for two." })) }),
        )
        .route(
            "/v1/chat/completions",
            post(|| async {
                Json(json!({
                    "choices": [{
                        "message": {
                            "content": json!({
                                "summary": "Table booking for two.",
                                "category": "reservations",
                                "action_items": ["Confirm booking"]
                            }).to_string()
                        }
                    }]
                }))
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn completed_recording_produces_a_report() {
    let upstream = spawn_upstreams().await;
    let mut config = Config::default();
    config.telephony.account_sid = "AC1".into();
    config.telephony.auth_token = "token".into();
    config.telephony.api_host = upstream.to_string();
    config.pipeline.enabled = true;
    config.pipeline.webhook_secret = "hook".into();
    config.pipeline.transcription.base_url = format!("http://{}/v1", upstream);
    config.pipeline.summary.base_url = format!("http://{}/v1", upstream);
    let app = app(AppState::from_config(&config));

    let form = format!(
        "CallSid=CA9&RecordingSid=RE9&RecordingUrl=http%3A%2F%2F{}%2FRecordings%2FRE9&RecordingStatus=completed",
        upstream
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recording-status?token=hook")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let mut report = None;
    for _ in 0..50 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/calls/CA9/report")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        if response.status() == StatusCode::OK {
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            report = Some(serde_json::from_slice::<Value>(&bytes).unwrap());
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let report = report.expect("report was never produced");
    assert_eq!(report["recording_sid"], "RE9");
    assert_eq!(report["transcript"], "I would like to book a table for two.");
    assert_eq!(report["summary"]["category"], "reservations");
    assert_eq!(report["emailed"], false);
}
