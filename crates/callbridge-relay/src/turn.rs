//! Turn-taking: the only place that decides when caller audio is committed,
//! when a response is requested, and when one is cancelled.

use crate::config::TurnConfig;
use crate::downstream::DownstreamSession;
use crate::session::CallSession;
use crate::upstream::UpstreamSession;
use callbridge_types::{AudioFrame, ProviderDirective};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a speech-stopped event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    /// Commit and `response.create` were sent.
    Committed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ResponseInProgress,
    Debounced,
    InsufficientAudio,
}

impl SkipReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::ResponseInProgress => "response in progress",
            Self::Debounced => "duplicate speech-stopped",
            Self::InsufficientAudio => "not enough buffered audio",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnController {
    config: TurnConfig,
}

impl TurnController {
    pub fn new(config: TurnConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// Requests the opening response so the assistant speaks before the caller.
    pub fn greet(&self, session: &mut CallSession, upstream: &UpstreamSession) {
        upstream.send(&upstream.greeting());
        session.response_in_progress = true;
        session.discarding_cancelled = false;
        debug!(call_id = %session.call_id, "greeting requested");
    }

    /// Accounts for one inbound caller frame, interrupting the assistant if
    /// it is still speaking.
    pub fn on_caller_frame(
        &self,
        session: &mut CallSession,
        upstream: &UpstreamSession,
        downstream: &DownstreamSession,
    ) {
        if session.response_in_progress && self.config.barge_in_on_media {
            self.barge_in(session, upstream, downstream, "caller audio");
        }
        session.buffered_audio_ms = session
            .buffered_audio_ms
            .saturating_add(self.config.frame_ms);
    }

    pub fn on_speech_started(
        &self,
        session: &mut CallSession,
        upstream: &UpstreamSession,
        downstream: &DownstreamSession,
    ) {
        if session.response_in_progress {
            self.barge_in(session, upstream, downstream, "speech started");
        } else {
            debug!(call_id = %session.call_id, "caller speech started");
        }
    }

    /// Ends the caller's turn: commits buffered audio and asks for a reply,
    /// unless a response is already running, the event is a duplicate, or too
    /// little audio has been buffered for the provider to accept a commit.
    pub fn on_speech_stopped(
        &self,
        session: &mut CallSession,
        upstream: &UpstreamSession,
        now: Instant,
    ) -> TurnDecision {
        let previous = session.last_speech_stopped_at.replace(now);
        let debounce = Duration::from_millis(self.config.speech_stop_debounce_ms);

        let skip = if session.response_in_progress {
            Some(SkipReason::ResponseInProgress)
        } else if previous.is_some_and(|at| now.saturating_duration_since(at) < debounce) {
            Some(SkipReason::Debounced)
        } else if session.buffered_audio_ms < self.config.min_commit_ms {
            Some(SkipReason::InsufficientAudio)
        } else {
            None
        };

        if let Some(reason) = skip {
            debug!(
                call_id = %session.call_id,
                buffered_ms = session.buffered_audio_ms,
                reason = reason.as_str(),
                "speech stopped, not committing"
            );
            return TurnDecision::Skipped(reason);
        }

        upstream.send(&ProviderDirective::InputAudioCommit);
        upstream.send(&ProviderDirective::ResponseCreate { response: None });

        info!(
            call_id = %session.call_id,
            buffered_ms = session.buffered_audio_ms,
            "caller turn committed"
        );
        session.buffered_audio_ms = 0;
        session.response_in_progress = true;
        session.discarding_cancelled = false;
        TurnDecision::Committed
    }

    pub fn on_response_created(&self, session: &mut CallSession) {
        session.response_in_progress = true;
        session.discarding_cancelled = false;
    }

    pub fn on_response_done(&self, session: &mut CallSession) {
        session.response_in_progress = false;
    }

    /// Passes synthesized audio on to the caller. Returns `false` for trailing
    /// audio of a response that was cancelled by barge-in.
    pub fn gate_output(
        &self,
        session: &mut CallSession,
        downstream: &DownstreamSession,
        frame: AudioFrame,
    ) -> bool {
        if session.discarding_cancelled {
            return false;
        }
        downstream.send_audio(session, frame);
        true
    }

    fn barge_in(
        &self,
        session: &mut CallSession,
        upstream: &UpstreamSession,
        downstream: &DownstreamSession,
        trigger: &'static str,
    ) {
        let discarded = session.pending_outbound.clear();
        upstream.send(&ProviderDirective::ResponseCancel);
        if self.config.clear_on_barge_in {
            downstream.clear_playback(session);
        }
        session.response_in_progress = false;
        session.discarding_cancelled = true;

        info!(
            call_id = %session.call_id,
            trigger,
            discarded,
            "caller barged in, response cancelled"
        );
    }
}
