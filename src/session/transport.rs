//! Media and peer-transport seams.
//!
//! Microphone capture, audio rendering, and the peer connection itself
//! are platform concerns; the negotiator only needs the handful of
//! operations below. Implementations adapt whatever media stack the host
//! embeds; tests drive the negotiator with in-process fakes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SessionError;

// ── Audio capture ─────────────────────────────────────────────────

/// Capture processing requested from the audio backend.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

/// Source of local microphone audio.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Acquire a local audio track set. Permission denial and missing
    /// devices surface as [`SessionError::MediaAcquisition`].
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn LocalAudio>, SessionError>;
}

/// An acquired set of local audio tracks.
#[async_trait]
pub trait LocalAudio: Send + Sync {
    /// Identifier for logging.
    fn id(&self) -> &str;

    /// Stop every track. Idempotent; stopping released tracks is a no-op.
    async fn stop(&mut self);
}

// ── Event channel ─────────────────────────────────────────────────

/// Receiving half of the side-channel event transport.
///
/// The transport feeds inbound UTF-8 payloads into the sender half; the
/// negotiator hands the receiver to the engine pump. Closing is
/// idempotent.
pub struct EventChannelHandle {
    label: String,
    inbound: Option<mpsc::Receiver<String>>,
    closed: bool,
}

impl EventChannelHandle {
    pub fn new(label: impl Into<String>, inbound: mpsc::Receiver<String>) -> Self {
        Self {
            label: label.into(),
            inbound: Some(inbound),
            closed: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Take the inbound receiver for the pump task. Returns `None` after
    /// the first call or once closed.
    pub fn take_inbound(&mut self) -> Option<mpsc::Receiver<String>> {
        self.inbound.take()
    }

    /// Close the channel. A closed (or never-opened) channel closes
    /// without error.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inbound = None;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

// ── Peer transport ────────────────────────────────────────────────

/// The peer-connection operations the negotiator drives, in the order it
/// drives them: attach local audio, open the event channel, create the
/// offer, apply the answer. `close` must be idempotent and callable at
/// any point of a partially-built connection.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Attach the acquired local audio tracks for sending.
    async fn attach_local_audio(&mut self, tracks: &dyn LocalAudio) -> Result<(), SessionError>;

    /// Open the labeled, ordered, reliable event channel. Must be called
    /// before [`PeerTransport::create_offer`] so the channel is part of
    /// the negotiated session.
    async fn open_event_channel(&mut self, label: &str)
        -> Result<EventChannelHandle, SessionError>;

    /// Build a session description offer scoped to receive audio.
    async fn create_offer(&mut self) -> Result<String, SessionError>;

    /// Apply the remote SDP answer, completing negotiation.
    async fn apply_answer(&mut self, sdp: &str) -> Result<(), SessionError>;

    /// Tear the connection down. Safe to call repeatedly.
    async fn close(&mut self);
}

/// Creates one peer transport per session.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PeerTransport>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraints_default_to_full_processing() {
        let c = CaptureConstraints::default();
        assert!(c.echo_cancellation);
        assert!(c.noise_suppression);
        assert!(c.auto_gain);
    }

    #[tokio::test]
    async fn event_channel_inbound_is_taken_once() {
        let (_tx, rx) = mpsc::channel(1);
        let mut handle = EventChannelHandle::new("oai-events", rx);
        assert_eq!(handle.label(), "oai-events");
        assert!(handle.take_inbound().is_some());
        assert!(handle.take_inbound().is_none());
    }

    #[tokio::test]
    async fn event_channel_close_is_idempotent() {
        let (_tx, rx) = mpsc::channel(1);
        let mut handle = EventChannelHandle::new("oai-events", rx);
        handle.close();
        handle.close();
        assert!(handle.is_closed());
        assert!(handle.take_inbound().is_none());
    }
}
