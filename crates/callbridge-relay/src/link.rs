//! Fire-and-forget outbound handle to one side of a call.
//!
//! Each WebSocket has a writer task that drains a bounded channel of
//! [`LinkCommand`]s. Handlers never await a send: a full or closed channel
//! simply discards the message.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Instruction for a socket writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    Text(String),
    Close,
}

#[derive(Debug, Clone)]
pub struct Link {
    peer: &'static str,
    tx: mpsc::Sender<LinkCommand>,
    closed: Arc<AtomicBool>,
}

impl Link {
    /// Creates a link and the receiver its writer task should drain.
    pub fn channel(peer: &'static str, capacity: usize) -> (Self, mpsc::Receiver<LinkCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let link = Self {
            peer,
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        };
        (link, rx)
    }

    pub fn peer(&self) -> &'static str {
        self.peer
    }

    /// Serializes and queues a message. Returns `false` if it was discarded.
    pub fn send_json<T: Serialize>(&self, message: &T) -> bool {
        match serde_json::to_string(message) {
            Ok(text) => self.send_text(text),
            Err(e) => {
                tracing::error!(peer = self.peer, "failed to serialize outbound message: {}", e);
                false
            }
        }
    }

    /// Queues a text frame. Returns `false` if it was discarded.
    pub fn send_text(&self, text: String) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.tx.try_send(LinkCommand::Text(text)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(peer = self.peer, "dropping outbound message for slow peer");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(peer = self.peer, "dropping outbound message, writer gone");
                false
            }
        }
    }

    /// Asks the writer to close the socket. Only the first call has any
    /// effect; it returns `true`.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        // A full or closed channel still ends the writer once every sender is dropped.
        let _ = self.tx.try_send(LinkCommand::Close);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn close_is_idempotent() {
        let (link, mut rx) = Link::channel("test", 8);

        assert!(link.close());
        assert!(!link.close());
        assert!(!link.clone().close());

        assert_eq!(rx.try_recv().unwrap(), LinkCommand::Close);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sends_after_close_are_discarded() {
        let (link, mut rx) = Link::channel("test", 8);
        link.close();

        assert!(!link.send_json(&json!({ "a": 1 })));
        assert_eq!(rx.try_recv().unwrap(), LinkCommand::Close);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_or_dropped_channel_discards_silently() {
        let (link, rx) = Link::channel("test", 1);
        assert!(link.send_text("one".into()));
        assert!(!link.send_text("two".into()));

        drop(rx);
        assert!(!link.send_text("three".into()));
        assert!(link.close());
    }
}
