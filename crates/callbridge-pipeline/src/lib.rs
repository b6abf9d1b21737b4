//! Post-call processing for recorded calls.
//!
//! When the telephony platform reports a finished recording, the
//! [`RecordingPipeline`] downloads it, transcribes it, asks a chat model for
//! a summary, and mails the result. Finished [`CallReport`]s are kept for a
//! while in an [`ExpiringCache`] so operators can fetch them over HTTP.

pub mod cache;
pub mod config;
pub mod error;
pub mod mailer;
pub mod pipeline;
pub mod recording;
pub mod summary;
pub mod transcribe;

pub use cache::ExpiringCache;
pub use config::{EmailConfig, PipelineConfig, SummaryConfig, TelephonyCredentials, TranscriptionConfig};
pub use error::PipelineError;
pub use mailer::Mailer;
pub use pipeline::{CallReport, RecordingJob, RecordingPipeline};
pub use recording::RecordingFetcher;
pub use summary::{CallSummary, Summarizer};
pub use transcribe::Transcriber;
