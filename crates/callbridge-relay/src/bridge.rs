//! Per-call orchestration of the relay components.

use crate::config::{ProviderConfig, RelayConfig};
use crate::downstream::DownstreamSession;
use crate::link::Link;
use crate::session::CallSession;
use crate::turn::TurnController;
use crate::upstream::UpstreamSession;
use callbridge_types::{AudioFrame, ProviderEvent, TelephonyEvent};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Whether the driving loop should keep pumping messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Owns the state of one call and routes events between the telephony peer
/// and the speech provider.
///
/// The bridge performs no I/O itself: outbound traffic goes through the two
/// [`Link`]s, and the caller feeds it inbound text frames one at a time.
#[derive(Debug)]
pub struct Bridge {
    session: CallSession,
    upstream: UpstreamSession,
    downstream: DownstreamSession,
    turn: TurnController,
    torn_down: bool,
}

impl Bridge {
    pub fn new(
        call_id: Uuid,
        telephony: Link,
        provider: Link,
        provider_config: Arc<ProviderConfig>,
        relay: &RelayConfig,
    ) -> Self {
        Self {
            session: CallSession::new(call_id, &relay.buffers),
            upstream: UpstreamSession::new(provider, provider_config),
            downstream: DownstreamSession::new(telephony),
            turn: TurnController::new(relay.turn.clone()),
            torn_down: false,
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn call_id(&self) -> Uuid {
        self.session.call_id
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// The provider handshake completed: configure it, release queued caller
    /// audio and ask for the greeting.
    pub fn on_provider_open(&mut self) {
        if self.torn_down {
            return;
        }
        self.upstream.open(&mut self.session);
        self.turn.greet(&mut self.session, &self.upstream);
    }

    pub fn on_telephony_message(&mut self, text: &str) -> Flow {
        if self.torn_down {
            return Flow::Stop;
        }
        let Some(event) = self.downstream.interpret(&self.session, text) else {
            return Flow::Continue;
        };

        match event {
            TelephonyEvent::Connected => {
                debug!(call_id = %self.session.call_id, "telephony stream connected");
            }
            TelephonyEvent::Start { stream_sid, start } => {
                let start = start.unwrap_or_default();
                match stream_sid.or(start.stream_sid) {
                    Some(stream_sid) => {
                        self.downstream
                            .on_start(&mut self.session, stream_sid, start.call_sid)
                    }
                    None => warn!(
                        call_id = %self.session.call_id,
                        "start event without a stream identity, ignoring"
                    ),
                }
            }
            TelephonyEvent::Media { media } => {
                let payload = media
                    .and_then(|m| m.payload)
                    .filter(|payload| !payload.is_empty());
                if let Some(payload) = payload {
                    self.turn
                        .on_caller_frame(&mut self.session, &self.upstream, &self.downstream);
                    self.upstream
                        .forward_audio(&mut self.session, AudioFrame::new(payload));
                }
            }
            TelephonyEvent::Stop { .. } => {
                info!(
                    call_id = %self.session.call_id,
                    stream_sid = self.session.stream_sid.as_deref().unwrap_or("-"),
                    "telephony peer stopped the stream"
                );
                return Flow::Stop;
            }
            TelephonyEvent::Unknown => {
                trace!(call_id = %self.session.call_id, "ignoring telephony event");
            }
        }
        Flow::Continue
    }

    pub fn on_provider_message(&mut self, text: &str, now: Instant) -> Flow {
        if self.torn_down {
            return Flow::Stop;
        }
        let Some(event) = self.upstream.interpret(&self.session, text) else {
            return Flow::Continue;
        };

        match event {
            ProviderEvent::AudioDelta { delta, .. } => {
                if let Some(delta) = delta.filter(|d| !d.is_empty()) {
                    self.turn
                        .gate_output(&mut self.session, &self.downstream, AudioFrame::new(delta));
                }
            }
            ProviderEvent::ResponseCreated { .. } => {
                self.turn.on_response_created(&mut self.session);
            }
            ProviderEvent::ResponseDone { response } => {
                debug!(
                    call_id = %self.session.call_id,
                    status = response
                        .as_ref()
                        .and_then(|r| r.status.as_deref())
                        .unwrap_or("-"),
                    "response finished"
                );
                self.turn.on_response_done(&mut self.session);
            }
            ProviderEvent::SpeechStarted { .. } => {
                self.turn
                    .on_speech_started(&mut self.session, &self.upstream, &self.downstream);
            }
            ProviderEvent::SpeechStopped { .. } => {
                self.turn
                    .on_speech_stopped(&mut self.session, &self.upstream, now);
            }
            ProviderEvent::Error { error } => {
                self.upstream.report_error(&self.session, error.as_ref());
            }
            ProviderEvent::SessionCreated | ProviderEvent::SessionUpdated => {
                debug!(call_id = %self.session.call_id, "provider session acknowledged");
            }
            ProviderEvent::Unknown => {
                trace!(call_id = %self.session.call_id, "ignoring provider event");
            }
        }
        Flow::Continue
    }

    /// Closes both connections. Safe to call any number of times; only the
    /// first call does anything and returns `true`.
    pub fn teardown(&mut self, reason: &str) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.upstream.close();
        self.downstream.close();

        info!(
            call_id = %self.session.call_id,
            stream_sid = self.session.stream_sid.as_deref().unwrap_or("-"),
            call_sid = self.session.call_sid.as_deref().unwrap_or("-"),
            reason,
            inbound_dropped = self.session.pending_inbound.dropped(),
            outbound_dropped = self.session.pending_outbound.dropped(),
            "call torn down"
        );
        true
    }
}
