//! Telephony side of a call: envelope decoding, stream identity, and
//! delivery of synthesized audio.

use crate::link::Link;
use crate::session::CallSession;
use callbridge_types::{AudioFrame, TelephonyEvent, TelephonyMessage};
use tracing::{debug, info};

#[derive(Debug)]
pub struct DownstreamSession {
    link: Link,
}

impl DownstreamSession {
    pub fn new(link: Link) -> Self {
        Self { link }
    }

    /// Decodes a telephony text frame. Malformed frames are logged and dropped.
    pub fn interpret(&self, session: &CallSession, text: &str) -> Option<TelephonyEvent> {
        let event = TelephonyEvent::parse(text);
        if event.is_none() {
            debug!(
                call_id = %session.call_id,
                len = text.len(),
                "ignoring malformed telephony message"
            );
        }
        event
    }

    /// Records the stream identity and flushes audio that arrived before it.
    pub fn on_start(&self, session: &mut CallSession, stream_sid: String, call_sid: Option<String>) {
        let queued = session.pending_outbound.len();
        session.pending_outbound.drain_to(|frame| self.send_media(&stream_sid, frame));

        info!(
            call_id = %session.call_id,
            stream_sid = %stream_sid,
            call_sid = call_sid.as_deref().unwrap_or("-"),
            queued,
            "media stream started"
        );

        session.stream_sid = Some(stream_sid);
        if call_sid.is_some() {
            session.call_sid = call_sid;
        }
    }

    /// Sends a synthesized frame, or queues it until the stream identity is known.
    pub fn send_audio(&self, session: &mut CallSession, frame: AudioFrame) {
        match session.stream_sid.as_deref() {
            Some(stream_sid) => self.send_media(stream_sid, frame),
            None => session.pending_outbound.enqueue(frame),
        }
    }

    fn send_media(&self, stream_sid: &str, frame: AudioFrame) {
        self.link
            .send_json(&TelephonyMessage::media(stream_sid, frame.into_payload()));
    }

    /// Asks the peer to discard audio it has buffered but not yet played.
    pub fn clear_playback(&self, session: &CallSession) -> bool {
        match session.stream_sid.as_deref() {
            Some(stream_sid) => self.link.send_json(&TelephonyMessage::clear(stream_sid)),
            None => false,
        }
    }

    pub fn close(&self) -> bool {
        self.link.close()
    }
}
