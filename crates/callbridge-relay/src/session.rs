use crate::buffer::FrameBuffer;
use crate::config::BufferConfig;
use callbridge_types::AudioFrame;
use std::time::Instant;
use uuid::Uuid;

/// Mutable state of one relayed call.
///
/// Owned by [`crate::Bridge`] and lent to the session components by `&mut`
/// for the duration of a single event.
#[derive(Debug)]
pub struct CallSession {
    /// Local identifier used in logs.
    pub call_id: Uuid,
    /// Media stream identity, known once the telephony `start` arrives.
    pub stream_sid: Option<String>,
    /// Telephony call identifier, shared with the recording pipeline.
    pub call_sid: Option<String>,
    /// The provider handshake and session configuration are done.
    pub upstream_ready: bool,
    /// Caller audio waiting for the provider.
    pub pending_inbound: FrameBuffer<AudioFrame>,
    /// Synthesized audio waiting for the stream identity.
    pub pending_outbound: FrameBuffer<AudioFrame>,
    pub response_in_progress: bool,
    /// Caller audio sent since the last commit.
    pub buffered_audio_ms: u32,
    pub last_speech_stopped_at: Option<Instant>,
    /// Set on barge-in; trailing deltas of the cancelled response are dropped
    /// until the provider acknowledges a new response.
    pub discarding_cancelled: bool,
}

impl CallSession {
    pub fn new(call_id: Uuid, buffers: &BufferConfig) -> Self {
        Self {
            call_id,
            stream_sid: None,
            call_sid: None,
            upstream_ready: false,
            pending_inbound: FrameBuffer::new(buffers.inbound_capacity),
            pending_outbound: FrameBuffer::new(buffers.outbound_capacity),
            response_in_progress: false,
            buffered_audio_ms: 0,
            last_speech_stopped_at: None,
            discarding_cancelled: false,
        }
    }
}
