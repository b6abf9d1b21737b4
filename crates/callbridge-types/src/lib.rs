//! Wire types shared across the callbridge crates.
//!
//! Two JSON-over-WebSocket protocols meet in the relay: the telephony media
//! stream (envelopes tagged by `event`) and the hosted realtime speech API
//! (messages tagged by `type`). Both are decoded into tagged enums at the
//! boundary, with an `Unknown` arm so that protocol additions on either side
//! are ignored instead of tearing a call down.

pub mod provider;
pub mod telephony;

use serde::{Deserialize, Serialize};

pub use provider::{
    ProviderDirective, ProviderErrorDetail, ProviderEvent, ResponseOptions, ResponseRef,
    SessionSettings, TurnDetection,
};
pub use telephony::{MediaPayload, StartMetadata, TelephonyEvent, TelephonyMessage};

/// Audio encoding used on both legs of the relay: 8 kHz G.711 µ-law.
pub const G711_ULAW: &str = "g711_ulaw";

/// A single base64-encoded audio frame.
///
/// Both the telephony peer and the provider exchange µ-law audio as base64
/// text, so frames are relayed without being decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFrame(String);

impl AudioFrame {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// Returns the base64 payload.
    pub fn payload(&self) -> &str {
        &self.0
    }

    pub fn into_payload(self) -> String {
        self.0
    }
}

impl From<String> for AudioFrame {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}
