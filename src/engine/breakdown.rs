//! Structured translation breakdown: sentence pair plus per-word glosses.
//!
//! A breakdown arrives either as one self-contained event or as a run of
//! delta fragments sharing a correlation key, terminated by a done event.
//! Fragments are concatenated in arrival order and parsed exactly once,
//! when the done event lands. Each parsed payload replaces the previous
//! one outright; breakdowns are never merged incrementally.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::extract::extract_text;

// ── Payload ───────────────────────────────────────────────────────

/// One word-level row: source token, its translation, and a short gloss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordGloss {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub gloss: String,
}

/// A complete breakdown: the sentence pair and its word rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownPayload {
    /// Original (spoken) sentence.
    pub source: String,
    /// Translated sentence.
    pub target: String,
    /// Ordered per-word rows; may be empty for short utterances.
    #[serde(default)]
    pub words: Vec<WordGloss>,
}

/// What the presentation surface renders for a breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakdownView {
    /// Parsed sentence pair with word rows.
    Structured(BreakdownPayload),
    /// The provider sent prose instead of structure; shown verbatim.
    Text(String),
}

/// Parse a breakdown from an event or an assembled chunk body.
///
/// The payload fields may sit at the top level or under a generic
/// `data` (or `breakdown`) wrapper; both shapes are accepted. When no
/// structured payload parses but the value carries text, that text
/// becomes a free-form fallback.
pub fn parse_breakdown(value: &Value) -> Option<BreakdownView> {
    for candidate in [Some(value), value.get("data"), value.get("breakdown")]
        .into_iter()
        .flatten()
    {
        if let Ok(payload) = serde_json::from_value::<BreakdownPayload>(candidate.clone()) {
            return Some(BreakdownView::Structured(payload));
        }
        // The wrapper itself may carry another data layer.
        if let Some(inner) = candidate.get("data") {
            if let Ok(payload) = serde_json::from_value::<BreakdownPayload>(inner.clone()) {
                return Some(BreakdownView::Structured(payload));
            }
        }
    }
    extract_text(value).map(BreakdownView::Text)
}

// ── Chunk assembly ────────────────────────────────────────────────

/// Accumulates breakdown fragments keyed by their correlation id.
///
/// Fragments for distinct keys interleave freely; each key's fragments
/// are concatenated in arrival order.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    pending: HashMap<String, String>,
}

impl ChunkBuffer {
    /// Append a fragment for the given correlation key.
    pub fn push(&mut self, key: &str, fragment: &str) {
        self.pending.entry(key.to_string()).or_default().push_str(fragment);
    }

    /// Remove and return the assembled body for a key, if any fragments
    /// arrived for it.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.pending.remove(key)
    }

    /// Drop all buffered fragments.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_top_level_payload() {
        let v = json!({"source": "Hola", "target": "Hello"});
        let view = parse_breakdown(&v).unwrap();
        assert_eq!(
            view,
            BreakdownView::Structured(BreakdownPayload {
                source: "Hola".into(),
                target: "Hello".into(),
                words: vec![],
            })
        );
    }

    #[test]
    fn parses_data_wrapped_payload() {
        let v = json!({
            "data": {
                "source": "Hola amigo",
                "target": "Hello friend",
                "words": [
                    {"source": "Hola", "target": "Hello", "gloss": "greeting"},
                    {"source": "amigo", "target": "friend", "gloss": "noun"}
                ]
            }
        });
        match parse_breakdown(&v).unwrap() {
            BreakdownView::Structured(payload) => {
                assert_eq!(payload.words.len(), 2);
                assert_eq!(payload.words[0].gloss, "greeting");
            }
            other => panic!("expected structured breakdown, got {other:?}"),
        }
    }

    #[test]
    fn word_gloss_field_is_optional() {
        let v = json!({
            "source": "Hola",
            "target": "Hello",
            "words": [{"source": "Hola", "target": "Hello"}]
        });
        match parse_breakdown(&v).unwrap() {
            BreakdownView::Structured(payload) => assert_eq!(payload.words[0].gloss, ""),
            other => panic!("expected structured breakdown, got {other:?}"),
        }
    }

    #[test]
    fn prose_payload_becomes_text_fallback() {
        let v = json!({"text": "The phrase is idiomatic and has no word-level mapping."});
        assert_eq!(
            parse_breakdown(&v),
            Some(BreakdownView::Text(
                "The phrase is idiomatic and has no word-level mapping.".into()
            ))
        );
    }

    #[test]
    fn empty_event_yields_nothing() {
        assert_eq!(parse_breakdown(&json!({"type": "breakdown"})), None);
    }

    #[test]
    fn chunk_buffer_concatenates_per_key() {
        let mut buf = ChunkBuffer::default();
        buf.push("r1", "{\"source\":\"Hola\",");
        buf.push("r2", "unrelated");
        buf.push("r1", "\"target\":\"Hello\"}");

        let body = buf.take("r1").unwrap();
        assert_eq!(body, "{\"source\":\"Hola\",\"target\":\"Hello\"}");
        assert!(buf.take("r1").is_none());
        assert_eq!(buf.take("r2").unwrap(), "unrelated");
    }

    #[test]
    fn chunked_roundtrip_equals_direct_parse() {
        let mut buf = ChunkBuffer::default();
        buf.push("r1", "{\"source\":\"Hola\",");
        buf.push("r1", "\"target\":\"Hello\"}");

        let assembled: Value = serde_json::from_str(&buf.take("r1").unwrap()).unwrap();
        let direct: Value =
            serde_json::from_str("{\"source\":\"Hola\",\"target\":\"Hello\"}").unwrap();
        assert_eq!(assembled, direct);
        assert_eq!(parse_breakdown(&assembled), parse_breakdown(&direct));
    }
}
