//! Provider transport against a local WebSocket server.

use callbridge_relay::{provider, Link, ProviderConfig, ProviderSignal, RelayError};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::accept_hdr_async;

fn config_for(addr: std::net::SocketAddr) -> ProviderConfig {
    ProviderConfig {
        url: format!("ws://{}/v1/realtime?model=test", addr),
        api_key: "sk-test".into(),
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn missing_credential_is_rejected_before_connecting() {
    let (_link, commands) = Link::channel("provider", 8);
    let config = ProviderConfig {
        url: "ws://127.0.0.1:1/unreachable".into(),
        api_key: "   ".into(),
        ..ProviderConfig::default()
    };

    let result = provider::connect(&config, commands).await;
    assert!(matches!(result, Err(RelayError::MissingCredential)));
}

#[tokio::test]
async fn handshake_carries_auth_headers_and_relays_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (headers_tx, headers_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let header = |name: &str| {
                req.headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
            };
            let _ = headers_tx.send((header("authorization"), header("openai-beta")));
            Ok(resp)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();

        ws.send(Message::text(r#"{"type":"session.created"}"#))
            .await
            .unwrap();
        let received = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text.as_str().to_owned(),
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {:?}", other),
            }
        };
        ws.close(None).await.unwrap();
        received
    });

    let (link, commands) = Link::channel("provider", 8);
    let mut connection = provider::connect(&config_for(addr), commands)
        .await
        .unwrap();

    let (auth, beta) = headers_rx.await.unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(beta.as_deref(), Some("realtime=v1"));

    let first = tokio::time::timeout(Duration::from_secs(5), connection.recv())
        .await
        .unwrap();
    assert_eq!(
        first,
        Some(ProviderSignal::Text(r#"{"type":"session.created"}"#.into()))
    );

    assert!(link.send_text(r#"{"type":"input_audio_buffer.commit"}"#.into()));
    let received = server.await.unwrap();
    assert_eq!(received, r#"{"type":"input_audio_buffer.commit"}"#);

    let closed = tokio::time::timeout(Duration::from_secs(5), connection.recv())
        .await
        .unwrap();
    assert_eq!(closed, Some(ProviderSignal::Closed));
}

#[tokio::test]
async fn closing_the_link_closes_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue,
            }
        }
    });

    let (link, commands) = Link::channel("provider", 8);
    let _connection = provider::connect(&config_for(addr), commands)
        .await
        .unwrap();

    assert!(link.close());
    assert!(link.is_closed());
    let saw_close = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(saw_close);
}

#[tokio::test]
async fn unreachable_provider_reports_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (_link, commands) = Link::channel("provider", 8);
    let result = provider::connect(&config_for(addr), commands).await;
    assert!(matches!(result, Err(RelayError::Connect(_))));
}
