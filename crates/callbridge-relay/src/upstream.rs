//! Provider side of a call: session configuration, audio forwarding behind
//! the readiness gate, and decoding of provider events.

use crate::config::ProviderConfig;
use crate::link::Link;
use crate::session::CallSession;
use callbridge_types::{AudioFrame, ProviderDirective, ProviderErrorDetail, ProviderEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct UpstreamSession {
    link: Link,
    config: Arc<ProviderConfig>,
}

impl UpstreamSession {
    pub fn new(link: Link, config: Arc<ProviderConfig>) -> Self {
        Self { link, config }
    }

    /// Pushes the session configuration, opens the readiness gate and
    /// forwards every caller frame queued so far.
    pub fn open(&self, session: &mut CallSession) {
        self.send(&ProviderDirective::SessionUpdate {
            session: self.config.session_settings(),
        });
        session.upstream_ready = true;

        let queued = session.pending_inbound.len();
        session.pending_inbound.drain_to(|frame| self.append(frame));

        info!(
            call_id = %session.call_id,
            voice = %self.config.voice,
            queued,
            "provider session configured"
        );
    }

    /// Forwards a caller frame, or queues it while the provider is not ready.
    pub fn forward_audio(&self, session: &mut CallSession, frame: AudioFrame) {
        if session.upstream_ready {
            self.append(frame);
        } else {
            session.pending_inbound.enqueue(frame);
        }
    }

    fn append(&self, frame: AudioFrame) {
        self.send(&ProviderDirective::InputAudioAppend {
            audio: frame.into_payload(),
        });
    }

    /// The opening `response.create`, so the assistant speaks first.
    pub fn greeting(&self) -> ProviderDirective {
        ProviderDirective::ResponseCreate {
            response: self.config.greeting_options(),
        }
    }

    pub fn send(&self, directive: &ProviderDirective) -> bool {
        self.link.send_json(directive)
    }

    /// Decodes a provider text frame. Malformed frames are logged and dropped.
    pub fn interpret(&self, session: &CallSession, text: &str) -> Option<ProviderEvent> {
        let event = ProviderEvent::parse(text);
        if event.is_none() {
            debug!(
                call_id = %session.call_id,
                len = text.len(),
                "ignoring malformed provider message"
            );
        }
        event
    }

    /// Surfaces a provider-reported error. The session carries on.
    pub fn report_error(&self, session: &CallSession, detail: Option<&ProviderErrorDetail>) {
        let detail = detail.cloned().unwrap_or_default();
        warn!(
            call_id = %session.call_id,
            stream_sid = session.stream_sid.as_deref().unwrap_or("-"),
            kind = detail.kind.as_deref().unwrap_or("unknown"),
            code = detail.code.as_deref().unwrap_or("-"),
            "provider reported error: {}",
            detail.message.as_deref().unwrap_or("<no message>")
        );
    }

    pub fn close(&self) -> bool {
        self.link.close()
    }
}
