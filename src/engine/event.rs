//! Side-channel event classification.
//!
//! Inbound payloads are loosely-typed JSON whose `type` discriminator may
//! be absent entirely. Known discriminators map to dedicated variants;
//! everything else lands in [`ChannelEvent::Unrecognized`] and is handled
//! by the generic extraction and role heuristics. A rigid schema decode
//! would reject half of what providers actually send.

use serde_json::Value;

/// A classified side-channel event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The user started a new utterance; the input buffer restarts.
    SpeechStarted,
    /// Legacy partial/final input transcript; overwrites the user buffer.
    LegacyTranscript { value: Value },
    /// A new agent response began.
    ResponseCreated { response_id: Option<String> },
    /// Incremental agent text for an in-flight response.
    OutputDelta { response_id: Option<String>, value: Value },
    /// Final agent text for a response.
    OutputDone { response_id: Option<String>, value: Value },
    /// The agent turn closed.
    ResponseCompleted { response_id: Option<String> },
    /// Self-contained breakdown payload.
    Breakdown { value: Value },
    /// Breakdown fragment, keyed by correlation id.
    BreakdownDelta { key: String, fragment: Option<String> },
    /// All fragments for a key have been sent.
    BreakdownDone { key: String },
    /// A transcript-ish event outside the known vocabulary. `input` is
    /// true when the type names the input/user side.
    OtherTranscript { input: bool, value: Value },
    /// Everything else; the generic heuristics decide what to do.
    Unrecognized { value: Value },
}

/// Event types carrying incremental agent text.
const DELTA_TYPES: [&str; 3] = [
    "response.output_text.delta",
    "response.text.delta",
    "response.audio_transcript.delta",
];

/// Event types carrying final agent text.
const DONE_TYPES: [&str; 3] = [
    "response.output_text.done",
    "response.text.done",
    "response.audio_transcript.done",
];

impl ChannelEvent {
    /// Classify a decoded payload by its `type` discriminator.
    pub fn classify(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        match kind.as_str() {
            "input_audio_buffer.speech_started" => Self::SpeechStarted,
            "transcript.partial" | "transcript.final" => Self::LegacyTranscript { value },
            "response.created" => Self::ResponseCreated {
                response_id: response_id(&value),
            },
            "response.done" | "response.completed" => Self::ResponseCompleted {
                response_id: response_id(&value),
            },
            "breakdown" => Self::Breakdown { value },
            "breakdown.delta" => Self::BreakdownDelta {
                key: correlation_key(&value),
                fragment: value
                    .get("delta")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            "breakdown.done" => Self::BreakdownDone {
                key: correlation_key(&value),
            },
            _ if DELTA_TYPES.contains(&kind.as_str()) => Self::OutputDelta {
                response_id: response_id(&value),
                value,
            },
            _ if DONE_TYPES.contains(&kind.as_str()) => Self::OutputDone {
                response_id: response_id(&value),
                value,
            },
            _ if kind.contains("transcript") => Self::OtherTranscript {
                input: kind.contains("input") || kind.contains("user"),
                value,
            },
            _ => Self::Unrecognized { value },
        }
    }
}

/// The response id correlating streamed fragments to one agent utterance:
/// a top-level `response_id`, else the nested `response.id`.
fn response_id(value: &Value) -> Option<String> {
    value
        .get("response_id")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("response")
                .and_then(|r| r.get("id"))
                .and_then(Value::as_str)
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Correlation key for chunked breakdowns: `response_id`, else `item_id`.
/// A missing key maps every fragment onto one anonymous stream.
fn correlation_key(value: &Value) -> String {
    response_id(value)
        .or_else(|| {
            value
                .get("item_id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// Language tag attached to a transcript event: top-level `language` or
/// `lang`, else one level down inside `transcript`.
pub fn language_tag(value: &Value) -> Option<String> {
    for candidate in [
        value.get("language"),
        value.get("lang"),
        value.get("transcript").and_then(|t| t.get("language")),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(tag) = candidate.as_str().filter(|s| !s.is_empty()) {
            return Some(tag.to_string());
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn speech_started() {
        let event = ChannelEvent::classify(json!({"type": "input_audio_buffer.speech_started"}));
        assert_eq!(event, ChannelEvent::SpeechStarted);
    }

    #[test]
    fn legacy_transcript_variants() {
        for kind in ["transcript.partial", "transcript.final"] {
            let event = ChannelEvent::classify(json!({"type": kind, "text": "hi"}));
            assert!(matches!(event, ChannelEvent::LegacyTranscript { .. }));
        }
    }

    #[test]
    fn response_created_reads_nested_id() {
        let event = ChannelEvent::classify(json!({"type": "response.created", "response": {"id": "r9"}}));
        assert_eq!(
            event,
            ChannelEvent::ResponseCreated {
                response_id: Some("r9".into())
            }
        );
    }

    #[test]
    fn delta_prefers_flat_response_id() {
        let event = ChannelEvent::classify(json!({
            "type": "response.output_text.delta",
            "response_id": "flat",
            "response": {"id": "nested"},
            "delta": "x"
        }));
        match event {
            ChannelEvent::OutputDelta { response_id, .. } => {
                assert_eq!(response_id.as_deref(), Some("flat"));
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn all_delta_and_done_spellings_classify() {
        for kind in DELTA_TYPES {
            let event = ChannelEvent::classify(json!({"type": kind, "delta": "a"}));
            assert!(matches!(event, ChannelEvent::OutputDelta { .. }), "{kind}");
        }
        for kind in DONE_TYPES {
            let event = ChannelEvent::classify(json!({"type": kind, "text": "a"}));
            assert!(matches!(event, ChannelEvent::OutputDone { .. }), "{kind}");
        }
    }

    #[test]
    fn completion_spellings() {
        for kind in ["response.done", "response.completed"] {
            let event = ChannelEvent::classify(json!({"type": kind}));
            assert!(matches!(event, ChannelEvent::ResponseCompleted { .. }));
        }
    }

    #[test]
    fn breakdown_delta_key_falls_back_to_item_id() {
        let event = ChannelEvent::classify(json!({
            "type": "breakdown.delta",
            "item_id": "i3",
            "delta": "{\"sou"
        }));
        assert_eq!(
            event,
            ChannelEvent::BreakdownDelta {
                key: "i3".into(),
                fragment: Some("{\"sou".into())
            }
        );
    }

    #[test]
    fn transcript_substring_routes_to_other_transcript() {
        let event =
            ChannelEvent::classify(json!({"type": "conversation.item.input_audio_transcription.completed", "transcript": "hi"}));
        assert!(matches!(
            event,
            ChannelEvent::OtherTranscript { input: true, .. }
        ));

        let event = ChannelEvent::classify(json!({"type": "agent.transcript.update", "text": "yo"}));
        assert!(matches!(
            event,
            ChannelEvent::OtherTranscript { input: false, .. }
        ));
    }

    #[test]
    fn missing_type_is_unrecognized() {
        let event = ChannelEvent::classify(json!({"text": "hello"}));
        assert!(matches!(event, ChannelEvent::Unrecognized { .. }));
    }

    #[test]
    fn language_tag_lookup_order() {
        assert_eq!(
            language_tag(&json!({"language": "es"})),
            Some("es".to_string())
        );
        assert_eq!(language_tag(&json!({"lang": "ko"})), Some("ko".to_string()));
        assert_eq!(
            language_tag(&json!({"transcript": {"language": "ja"}})),
            Some("ja".to_string())
        );
        assert_eq!(language_tag(&json!({"text": "hi"})), None);
    }
}
