//! Session negotiation: one connect-to-stop lifetime of a live voice
//! exchange.
//!
//! The negotiator drives a session from idle to live and guarantees every
//! acquired resource (microphone tracks, peer transport, event channel)
//! is released on every exit path, including mid-negotiation failure.
//! All per-session state lives in an owned [`SessionContext`] constructed
//! at connect time; there is no module-level mutable state, so multiple
//! independent sessions can exist across tests or embedders.

pub mod signaling;
pub mod transport;

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::broker::TokenBroker;
use crate::engine::{run_pump, Reconciler, TranscriptView};
use crate::error::SessionError;
use self::signaling::SignalingClient;
use self::transport::{
    AudioSource, CaptureConstraints, EventChannelHandle, LocalAudio, PeerFactory, PeerTransport,
};

// ── Lifecycle state ───────────────────────────────────────────────

/// Lifecycle of one session. `Failed` is reachable from every
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AcquiringMedia,
    MintingToken,
    Negotiating,
    Live,
    Stopped,
    Failed,
}

// ── Options ───────────────────────────────────────────────────────

/// Per-session parameters captured at connect time.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Target language the agent translates into.
    pub language: String,
    /// Whether the structured breakdown is rendered.
    pub verbose: bool,
    /// Label for the side-channel event transport.
    pub channel_label: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            language: "Spanish".into(),
            verbose: false,
            channel_label: "oai-events".into(),
        }
    }
}

// ── Session context ───────────────────────────────────────────────

/// Everything a live session owns. Dropped as a unit on stop/failure.
struct SessionContext {
    tracks: Box<dyn LocalAudio>,
    peer: Box<dyn PeerTransport>,
    channel: EventChannelHandle,
    pump: JoinHandle<()>,
}

// ── Negotiator ────────────────────────────────────────────────────

/// Owns the peer-connection lifecycle for one session at a time.
pub struct VoiceSession {
    session_id: String,
    opts: SessionOptions,
    audio: Arc<dyn AudioSource>,
    peers: Arc<dyn PeerFactory>,
    broker: TokenBroker,
    signaling: SignalingClient,
    engine: Arc<Mutex<Reconciler>>,
    state: SessionState,
    status: String,
    ctx: Option<SessionContext>,
}

impl VoiceSession {
    pub fn new(
        opts: SessionOptions,
        audio: Arc<dyn AudioSource>,
        peers: Arc<dyn PeerFactory>,
        broker: TokenBroker,
        signaling: SignalingClient,
    ) -> Self {
        let verbose = opts.verbose;
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            opts,
            audio,
            peers,
            broker,
            signaling,
            engine: Arc::new(Mutex::new(Reconciler::new(verbose))),
            state: SessionState::Idle,
            status: "idle".into(),
            ctx: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Human-readable connection status for the presentation surface.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Snapshot of the reconciled transcripts.
    pub async fn transcripts(&self) -> TranscriptView {
        self.engine.lock().await.view()
    }

    /// Drive the session from idle to live.
    ///
    /// On failure the session lands in [`SessionState::Failed`] with
    /// every partially-acquired resource released and a single status
    /// line describing what went wrong; connect may be retried.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.ctx.is_some() {
            return Err(SessionError::Negotiation(
                "a session is already live; stop it first".into(),
            ));
        }

        self.engine.lock().await.start_session(self.opts.verbose);

        self.transition(SessionState::AcquiringMedia, "requesting microphone…");
        let mut tracks = match self.audio.acquire(&CaptureConstraints::default()).await {
            Ok(tracks) => tracks,
            Err(e) => return self.fail(e),
        };
        tracing::debug!(session_id = %self.session_id, tracks = tracks.id(), "Local audio acquired");

        self.transition(SessionState::MintingToken, "minting token…");
        let token = match self
            .broker
            .mint(&self.opts.language, self.opts.verbose)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tracks.stop().await;
                return self.fail(e);
            }
        };

        self.set_status("creating peer connection…");
        let mut peer = match self.peers.create().await {
            Ok(peer) => peer,
            Err(e) => {
                tracks.stop().await;
                return self.fail(e);
            }
        };

        if let Err(e) = peer.attach_local_audio(tracks.as_ref()).await {
            peer.close().await;
            tracks.stop().await;
            return self.fail(e);
        }

        // The channel must exist before the offer so it is negotiated
        // into the session.
        let mut channel = match peer.open_event_channel(&self.opts.channel_label).await {
            Ok(channel) => channel,
            Err(e) => {
                peer.close().await;
                tracks.stop().await;
                return self.fail(e);
            }
        };

        let offer = match peer.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                channel.close();
                peer.close().await;
                tracks.stop().await;
                return self.fail(e);
            }
        };

        self.transition(SessionState::Negotiating, "negotiating with provider…");
        let answer = match self.signaling.exchange(&token, &offer).await {
            Ok(answer) => answer,
            Err(e) => {
                channel.close();
                peer.close().await;
                tracks.stop().await;
                return self.fail(e);
            }
        };

        if let Err(e) = peer.apply_answer(&answer).await {
            channel.close();
            peer.close().await;
            tracks.stop().await;
            return self.fail(e);
        }

        let Some(inbound) = channel.take_inbound() else {
            channel.close();
            peer.close().await;
            tracks.stop().await;
            return self.fail(SessionError::Negotiation(
                "event channel produced no inbound stream".into(),
            ));
        };
        let pump = tokio::spawn(run_pump(inbound, Arc::clone(&self.engine)));

        self.ctx = Some(SessionContext {
            tracks,
            peer,
            channel,
            pump,
        });
        self.transition(SessionState::Live, "live: speak now");
        Ok(())
    }

    /// Tear the session down. Safe to call from any state, any number of
    /// times; resources that were never acquired are skipped and closing
    /// already-closed handles is a no-op.
    pub async fn stop(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.channel.close();
            ctx.peer.close().await;
            ctx.tracks.stop().await;
            ctx.pump.abort();
            tracing::info!(session_id = %self.session_id, "Session resources released");
        }
        self.engine.lock().await.reset();
        self.state = SessionState::Stopped;
        self.status = "stopped".into();
    }

    // ── Internal ──────────────────────────────────────────────────

    fn transition(&mut self, state: SessionState, status: &str) {
        tracing::info!(
            session_id = %self.session_id,
            from = ?self.state,
            to = ?state,
            "Session state change"
        );
        self.state = state;
        self.status = status.into();
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.into();
    }

    fn fail(&mut self, err: SessionError) -> Result<(), SessionError> {
        tracing::error!(session_id = %self.session_id, error = %err, "Session failed");
        self.state = SessionState::Failed;
        self.status = err.status_line();
        Err(err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────
