//! Real-time audio bridge between a telephony media stream and a hosted
//! conversational speech API.
//!
//! One [`Bridge`] exists per call. It owns the [`CallSession`] state and
//! wires together four components:
//!
//! - [`FrameBuffer`]: bounded drop-oldest queues for audio that cannot be
//!   delivered yet,
//! - [`UpstreamSession`]: the provider connection (configuration, audio
//!   forwarding behind the readiness gate, event decoding),
//! - [`DownstreamSession`]: the telephony connection (stream identity,
//!   audio delivery),
//! - [`TurnController`]: commit / response / cancel decisions, including
//!   caller barge-in.
//!
//! The bridge does no I/O. Outbound traffic goes through [`Link`]s drained by
//! socket writer tasks, and the driving task feeds it inbound frames, so all
//! state of a call is mutated from a single task.

pub mod bridge;
pub mod buffer;
pub mod config;
pub mod downstream;
pub mod error;
pub mod link;
pub mod provider;
pub mod session;
pub mod turn;
pub mod upstream;

pub use bridge::{Bridge, Flow};
pub use buffer::FrameBuffer;
pub use config::{BufferConfig, ProviderConfig, RelayConfig, TurnConfig};
pub use downstream::DownstreamSession;
pub use error::RelayError;
pub use link::{Link, LinkCommand};
pub use provider::{ProviderConnection, ProviderSignal};
pub use session::CallSession;
pub use turn::{SkipReason, TurnController, TurnDecision};
pub use upstream::UpstreamSession;
