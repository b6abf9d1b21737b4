//! WebSocket transport to the realtime speech provider.
//!
//! [`connect`] performs the handshake and splits the socket into a writer
//! task, fed by the provider [`Link`](crate::Link)'s command channel, and a
//! reader task that turns frames into [`ProviderSignal`]s.

use crate::config::ProviderConfig;
use crate::error::RelayError;
use crate::link::LinkCommand;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;

/// Buffered inbound provider frames per call.
const PROVIDER_EVENT_CAPACITY: usize = 256;

/// What the reader task observed on the provider socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSignal {
    Text(String),
    /// The provider closed the connection.
    Closed,
    /// The transport failed.
    Failed(String),
}

/// A live provider connection.
///
/// Dropping it stops the reader; the writer finishes on its own once it has
/// processed a [`LinkCommand::Close`] or every link clone is gone.
#[derive(Debug)]
pub struct ProviderConnection {
    events: mpsc::Receiver<ProviderSignal>,
    reader: JoinHandle<()>,
}

impl ProviderConnection {
    /// Next signal from the provider. `None` once the reader has finished and
    /// every buffered signal has been consumed.
    pub async fn recv(&mut self) -> Option<ProviderSignal> {
        self.events.recv().await
    }
}

impl Drop for ProviderConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Opens the provider WebSocket with bearer authentication.
///
/// # Errors
///
/// Returns [`RelayError::MissingCredential`] without touching the network
/// when no API key is configured, and [`RelayError::Connect`] when the
/// handshake fails.
pub async fn connect(
    config: &ProviderConfig,
    commands: mpsc::Receiver<LinkCommand>,
) -> Result<ProviderConnection, RelayError> {
    if !config.has_credential() {
        return Err(RelayError::MissingCredential);
    }

    let mut request = config.url.as_str().into_client_request()?;
    let headers = request.headers_mut();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))?,
    );
    if let Some(beta) = &config.beta_header {
        headers.insert("openai-beta", HeaderValue::from_str(beta)?);
    }

    let (socket, _response) = connect_async(request).await?;
    tracing::debug!(url = %config.url, "provider websocket connected");

    let (sink, stream) = socket.split();
    let (events_tx, events) = mpsc::channel(PROVIDER_EVENT_CAPACITY);

    tokio::spawn(write_commands(sink, commands));
    let reader = tokio::spawn(async move {
        let mut stream = stream;
        while let Some(message) = stream.next().await {
            let signal = match message {
                Ok(Message::Text(text)) => ProviderSignal::Text(text.as_str().to_owned()),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "provider sent close frame");
                    let _ = events_tx.send(ProviderSignal::Closed).await;
                    return;
                }
                Ok(_) => continue,
                Err(e) => {
                    let _ = events_tx.send(ProviderSignal::Failed(e.to_string())).await;
                    return;
                }
            };
            if events_tx.send(signal).await.is_err() {
                return;
            }
        }
        let _ = events_tx.send(ProviderSignal::Closed).await;
    });

    Ok(ProviderConnection { events, reader })
}

/// Drains link commands into the socket until told to close, the link is
/// dropped, or the socket stops accepting writes.
async fn write_commands<S>(mut sink: S, mut commands: mpsc::Receiver<LinkCommand>)
where
    S: Sink<Message> + Unpin,
{
    while let Some(command) = commands.recv().await {
        match command {
            LinkCommand::Text(text) => {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            LinkCommand::Close => break,
        }
    }
    let _ = sink.close().await;
}
