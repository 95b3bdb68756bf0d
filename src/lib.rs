//! Live voice translation sessions for realtime speech providers.
//!
//! Connects a local microphone to a hosted realtime speech endpoint,
//! translating spoken input into a target language while reconstructing
//! two coherent transcripts (what the user said, what the agent said)
//! and an optional word-by-word translation breakdown from the
//! provider's heterogeneous side-channel event stream.
//!
//! ## Architecture
//! - [`broker`] — exchanges the backend secret for a short-lived session
//!   token (one call per session).
//! - [`session`] — the negotiator: acquires media, mints the token,
//!   exchanges SDP with the provider, opens the side channel, and
//!   guarantees teardown on every exit path.
//! - [`engine`] — the reconciliation engine: turns the unordered,
//!   loosely-typed event stream into monotonic transcript buffers and
//!   the optional breakdown.
//!
//! Media capture, audio rendering, and the peer connection itself sit
//! behind traits in [`session::transport`]; embedders plug in their
//! platform's media stack.

pub mod broker;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use broker::TokenBroker;
pub use config::Config;
pub use engine::breakdown::{BreakdownPayload, BreakdownView, WordGloss};
pub use engine::{Reconciler, TranscriptView};
pub use error::SessionError;
pub use session::signaling::SignalingClient;
pub use session::transport::{
    AudioSource, CaptureConstraints, EventChannelHandle, LocalAudio, PeerFactory, PeerTransport,
};
pub use session::{SessionOptions, SessionState, VoiceSession};
