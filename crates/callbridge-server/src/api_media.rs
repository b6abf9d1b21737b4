//! Media-stream WebSocket: one bridge per telephony connection.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use callbridge_relay::{
    provider, Bridge, Flow, Link, LinkCommand, ProviderConnection, ProviderSignal,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound frames queued per call towards the telephony socket. At 20 ms
/// per frame this is several seconds of audio.
const TELEPHONY_LINK_CAPACITY: usize = 512;

/// Outbound directives queued per call towards the provider.
const PROVIDER_LINK_CAPACITY: usize = 512;

pub async fn media_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_media_stream(socket, state))
}

/// Keeps the active-call gauge accurate however the call ends.
struct ActiveCall(Arc<AtomicUsize>);

impl ActiveCall {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter.clone())
    }
}

impl Drop for ActiveCall {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

async fn handle_media_stream(mut socket: WebSocket, state: Arc<AppState>) {
    let call_id = Uuid::new_v4();
    if !state.provider.has_credential() {
        tracing::error!(call_id = %call_id, "speech provider credential missing, closing media stream");
        let _ = socket.send(AxumMessage::Close(None)).await;
        return;
    }

    let _active = ActiveCall::enter(&state.active_calls);
    let (sender, mut receiver) = socket.split();

    let (telephony, telephony_rx) = Link::channel("telephony", TELEPHONY_LINK_CAPACITY);
    let (provider_link, provider_rx) = Link::channel("provider", PROVIDER_LINK_CAPACITY);
    let send_task = tokio::spawn(forward_to_telephony(sender, telephony_rx));

    let mut bridge = Bridge::new(
        call_id,
        telephony,
        provider_link,
        state.provider.clone(),
        &state.relay,
    );
    tracing::info!(call_id = %call_id, "media stream connected");

    // The provider handshake runs while telephony frames are already being
    // read; caller audio queues in the bridge until it completes.
    let provider_config = state.provider.clone();
    let mut connecting =
        tokio::spawn(async move { provider::connect(&provider_config, provider_rx).await });
    let mut connect_finished = false;
    let mut connection: Option<ProviderConnection> = None;

    let reason = loop {
        tokio::select! {
            joined = &mut connecting, if !connect_finished => {
                connect_finished = true;
                match joined {
                    Ok(Ok(conn)) => {
                        connection = Some(conn);
                        bridge.on_provider_open();
                    }
                    Ok(Err(e)) => {
                        tracing::error!(call_id = %call_id, "provider connection failed: {}", e);
                        break "provider connect failed";
                    }
                    Err(e) => {
                        tracing::error!(call_id = %call_id, "provider connect task failed: {}", e);
                        break "provider connect failed";
                    }
                }
            }
            message = receiver.next() => match message {
                Some(Ok(AxumMessage::Text(text))) => {
                    if bridge.on_telephony_message(text.as_str()) == Flow::Stop {
                        break "telephony stop";
                    }
                }
                Some(Ok(AxumMessage::Close(_))) | None => break "telephony closed",
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(call_id = %call_id, "telephony socket error: {}", e);
                    break "telephony error";
                }
            },
            signal = next_signal(&mut connection) => match signal {
                Some(ProviderSignal::Text(text)) => {
                    if bridge.on_provider_message(&text, Instant::now()) == Flow::Stop {
                        break "bridge stopped";
                    }
                }
                Some(ProviderSignal::Closed) | None => break "provider closed",
                Some(ProviderSignal::Failed(e)) => {
                    tracing::warn!(call_id = %call_id, "provider socket error: {}", e);
                    break "provider error";
                }
            },
        }
    };

    bridge.teardown(reason);
    if !connect_finished {
        connecting.abort();
    }
    drop(connection);
    drop(bridge);
    let _ = send_task.await;
    tracing::debug!(call_id = %call_id, "media stream handler finished");
}

async fn next_signal(connection: &mut Option<ProviderConnection>) -> Option<ProviderSignal> {
    match connection {
        Some(connection) => connection.recv().await,
        None => std::future::pending().await,
    }
}

/// Writes queued link commands to the telephony socket until closed.
async fn forward_to_telephony(
    mut sender: SplitSink<WebSocket, AxumMessage>,
    mut commands: mpsc::Receiver<LinkCommand>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            LinkCommand::Text(text) => {
                if sender.send(AxumMessage::Text(text.into())).await.is_err() {
                    break;
                }
            }
            LinkCommand::Close => {
                let _ = sender.send(AxumMessage::Close(None)).await;
                break;
            }
        }
    }
    let _ = sender.close().await;
}
