//! Transcript reconciliation engine.
//!
//! Consumes the raw side-channel event stream and maintains two monotonic
//! transcript buffers (what the user said, what the agent said) plus an
//! optional structured translation breakdown. The event vocabulary is
//! heterogeneous and partially duplicated across naming generations, so
//! handling is driven by an ordered classification ([`ChannelEvent`]) with
//! generic extraction/role heuristics as the last resort.
//!
//! The engine never assumes ordering between the audio timeline and the
//! event timeline; it only relies on the side channel itself being ordered.
//! Malformed payloads are dropped, never fatal.

pub mod breakdown;
pub mod event;
pub mod extract;
pub mod lang;

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use serde_json::Value;

use self::breakdown::{parse_breakdown, BreakdownView, ChunkBuffer};
use self::event::{language_tag, ChannelEvent};
use self::extract::{classify_role, extract_text, Role};

// ── Presentation surface ──────────────────────────────────────────

/// Snapshot of the observable transcript state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptView {
    /// What the user said (current utterance).
    pub user_transcript: String,
    /// What the agent said (current response).
    pub agent_transcript: String,
    /// Display label for the detected input language.
    pub input_label: Option<String>,
    /// Latest breakdown, present only when verbosity is on.
    pub breakdown: Option<BreakdownView>,
}

// ── Reconciler ────────────────────────────────────────────────────

/// Reconciles the raw event stream into coherent transcripts.
///
/// One instance exists per session; it is reset at session start and at
/// session stop. All mutation happens through [`Reconciler::apply`],
/// called by the pump task in side-channel delivery order.
#[derive(Debug)]
pub struct Reconciler {
    user_transcript: String,
    agent_transcript: String,
    active_response_id: Option<String>,
    detected_language: Option<String>,
    input_label: Option<String>,
    breakdown: Option<BreakdownView>,
    chunks: ChunkBuffer,
    /// Captured at session start; gates breakdown presentation.
    verbose: bool,
}

impl Reconciler {
    pub fn new(verbose: bool) -> Self {
        Self {
            user_transcript: String::new(),
            agent_transcript: String::new(),
            active_response_id: None,
            detected_language: None,
            input_label: None,
            breakdown: None,
            chunks: ChunkBuffer::default(),
            verbose,
        }
    }

    /// Clear all per-session state. The verbosity flag survives until the
    /// next [`Reconciler::start_session`].
    pub fn reset(&mut self) {
        self.user_transcript.clear();
        self.agent_transcript.clear();
        self.active_response_id = None;
        self.detected_language = None;
        self.input_label = None;
        self.breakdown = None;
        self.chunks.clear();
    }

    /// Reset for a fresh session with the verbosity captured at connect.
    pub fn start_session(&mut self, verbose: bool) {
        self.reset();
        self.verbose = verbose;
    }

    /// Current observable state.
    pub fn view(&self) -> TranscriptView {
        TranscriptView {
            user_transcript: self.user_transcript.clone(),
            agent_transcript: self.agent_transcript.clone(),
            input_label: self.input_label.clone(),
            breakdown: self.breakdown.clone(),
        }
    }

    /// Detected input language tag, when the provider reported one.
    pub fn detected_language(&self) -> Option<&str> {
        self.detected_language.as_deref()
    }

    /// Apply one raw side-channel payload.
    ///
    /// Non-JSON payloads and events with nothing to say are dropped
    /// without error; the side channel carries provider-internal traffic
    /// with no transcript relevance.
    pub fn apply(&mut self, raw: &str) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping non-JSON side-channel payload");
                return;
            }
        };
        self.apply_value(value);
    }

    /// Apply one already-decoded event.
    pub fn apply_value(&mut self, value: Value) {
        match ChannelEvent::classify(value) {
            ChannelEvent::SpeechStarted => {
                self.user_transcript.clear();
            }

            ChannelEvent::LegacyTranscript { value } => {
                let Some(text) = extract_text(&value) else {
                    return;
                };
                self.user_transcript = text;
                self.note_language(&value);
            }

            ChannelEvent::ResponseCreated { response_id } => {
                self.active_response_id = response_id;
                self.agent_transcript.clear();
            }

            ChannelEvent::OutputDelta { response_id, value } => {
                if !self.owns_active_response(response_id.as_deref()) {
                    tracing::debug!(
                        response_id = response_id.as_deref().unwrap_or(""),
                        "Dropping delta for stale response"
                    );
                    return;
                }
                if let Some(delta) = extract_text(&value) {
                    self.agent_transcript.push_str(&delta);
                }
            }

            ChannelEvent::OutputDone { response_id, value } => {
                if !self.owns_active_response(response_id.as_deref()) {
                    return;
                }
                // Prefer the explicit final text; keep the accumulated
                // deltas when the done event carries none.
                if let Some(text) = extract_text(&value) {
                    self.agent_transcript = text;
                }
            }

            ChannelEvent::ResponseCompleted { response_id } => {
                // An unattributed completion only closes the turn when no
                // response is active; while one is in flight, its id must
                // match explicitly.
                let closes = match (&response_id, &self.active_response_id) {
                    (Some(id), Some(active)) => id == active,
                    (_, None) => true,
                    (None, Some(_)) => false,
                };
                if closes {
                    self.active_response_id = None;
                }
            }

            ChannelEvent::Breakdown { value } => match parse_breakdown(&value) {
                Some(view) => self.store_breakdown(view),
                None => {
                    tracing::warn!("Discarding breakdown event with no parsable payload");
                }
            },

            ChannelEvent::BreakdownDelta { key, fragment } => {
                if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
                    self.chunks.push(&key, &fragment);
                }
            }

            ChannelEvent::BreakdownDone { key } => {
                let Some(body) = self.chunks.take(&key) else {
                    return;
                };
                match serde_json::from_str::<Value>(&body) {
                    Ok(assembled) => match parse_breakdown(&assembled) {
                        Some(view) => self.store_breakdown(view),
                        None => {
                            tracing::warn!(key = %key, "Assembled breakdown has no payload");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Discarding unparsable breakdown");
                    }
                }
            }

            ChannelEvent::OtherTranscript { input, value } => {
                let Some(text) = extract_text(&value) else {
                    return;
                };
                if input {
                    self.user_transcript = text;
                    self.note_language(&value);
                } else {
                    self.agent_transcript = text;
                }
            }

            ChannelEvent::Unrecognized { value } => {
                let Some(text) = extract_text(&value) else {
                    return;
                };
                // First utterance in a fresh session is overwhelmingly the
                // user; afterwards unattributed text goes to the agent.
                // Known approximation: an agent that speaks first is
                // misattributed.
                let role = classify_role(&value).unwrap_or(if self.user_transcript.is_empty() {
                    Role::User
                } else {
                    Role::Agent
                });
                match role {
                    Role::User => {
                        self.user_transcript = text;
                    }
                    Role::Agent => {
                        self.agent_transcript.push_str(&text);
                    }
                }
            }
        }
    }

    /// A delta/done event owns the active response when it carries no id
    /// at all or its id equals the active one.
    fn owns_active_response(&self, response_id: Option<&str>) -> bool {
        match response_id {
            None => true,
            Some(id) => self.active_response_id.as_deref() == Some(id),
        }
    }

    /// Record the event's language tag and recompute the input label.
    fn note_language(&mut self, value: &Value) {
        let Some(tag) = language_tag(value) else {
            return;
        };
        if self.detected_language.as_deref() != Some(tag.as_str()) {
            self.input_label = Some(lang::input_label(&tag));
            self.detected_language = Some(tag);
        }
    }

    fn store_breakdown(&mut self, view: BreakdownView) {
        if self.verbose {
            self.breakdown = Some(view);
        } else {
            tracing::debug!("Breakdown received but verbosity is off; not rendered");
        }
    }
}

// ── Pump task ─────────────────────────────────────────────────────

/// Drain the side-channel receiver into the engine, one payload at a
/// time, preserving delivery order. Ends when the transport drops its
/// sender.
pub async fn run_pump(mut inbound: mpsc::Receiver<String>, engine: Arc<Mutex<Reconciler>>) {
    while let Some(raw) = inbound.recv().await {
        engine.lock().await.apply(&raw);
    }
    tracing::debug!("Side-channel pump terminated");
}

// ── Tests ─────────────────────────────────────────────────────────
