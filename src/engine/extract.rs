//! Best-effort text extraction and role classification over loosely-typed
//! side-channel events.
//!
//! Providers have shipped several generations of event schemas, sometimes
//! populating more than one text field redundantly. Extraction is an
//! ordered fallback chain and the order is load-bearing: the first
//! non-empty source wins. Reordering the chain changes which field wins
//! when an event carries several.

use serde_json::Value;

// ── Text extraction ───────────────────────────────────────────────

/// Extract the text payload from an arbitrary event, trying each known
/// field shape in priority order:
///
/// 1. `text` — plain string
/// 2. `parts` — array of strings or `{text}` objects, concatenated
/// 3. `delta` — string, or object carrying `text` / `transcript`
/// 4. `transcript` — string, or object carrying `text` / `transcript`
/// 5. `message` — plain string
/// 6. `output_text` — string or array of strings
/// 7. deep traversal of `response` / `output` / `content` / `item`,
///    collecting every `text` / `transcript` / `delta` string in
///    document order
///
/// Returns `None` when no step yields non-empty text.
pub fn extract_text(value: &Value) -> Option<String> {
    if let Some(text) = non_empty_str(value.get("text")) {
        return Some(text.to_string());
    }

    if let Some(parts) = value.get("parts").and_then(Value::as_array) {
        let joined: String = parts
            .iter()
            .filter_map(|p| p.as_str().or_else(|| non_empty_str(p.get("text"))))
            .collect();
        if !joined.is_empty() {
            return Some(joined);
        }
    }

    if let Some(text) = string_or_nested(value.get("delta")) {
        return Some(text);
    }

    if let Some(text) = string_or_nested(value.get("transcript")) {
        return Some(text);
    }

    if let Some(text) = non_empty_str(value.get("message")) {
        return Some(text.to_string());
    }

    if let Some(out) = value.get("output_text") {
        if let Some(text) = non_empty_str(Some(out)) {
            return Some(text.to_string());
        }
        if let Some(items) = out.as_array() {
            let joined: String = items.iter().filter_map(Value::as_str).collect();
            if !joined.is_empty() {
                return Some(joined);
            }
        }
    }

    let mut collected = String::new();
    for key in ["response", "output", "content", "item"] {
        if let Some(nested) = value.get(key) {
            collect_fragments(nested, &mut collected);
        }
    }
    if collected.is_empty() {
        None
    } else {
        Some(collected)
    }
}

/// A field that may be a bare string or an object wrapping the string
/// under `text` / `transcript`.
fn string_or_nested(value: Option<&Value>) -> Option<String> {
    let value = value?;
    if let Some(text) = non_empty_str(Some(value)) {
        return Some(text.to_string());
    }
    if value.is_object() {
        if let Some(text) = non_empty_str(value.get("text")) {
            return Some(text.to_string());
        }
        if let Some(text) = non_empty_str(value.get("transcript")) {
            return Some(text.to_string());
        }
    }
    None
}

/// Walk a nested structure in document order, appending every string
/// found under a `text` / `transcript` / `delta` key.
fn collect_fragments(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                match key.as_str() {
                    "text" | "transcript" | "delta" => {
                        if let Some(s) = inner.as_str() {
                            out.push_str(s);
                        } else {
                            collect_fragments(inner, out);
                        }
                    }
                    _ => collect_fragments(inner, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_fragments(item, out);
            }
        }
        _ => {}
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

// ── Role classification ───────────────────────────────────────────

/// Which transcript buffer an unattributed event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// Fields inspected for a speaker role, in priority order.
const ROLE_FIELDS: [&str; 8] = [
    "participant",
    "role",
    "speaker",
    "source",
    "from",
    "direction",
    "channel",
    "track",
];

/// Sub-objects whose own role fields are also consulted (one level deep).
const ROLE_NESTS: [&str; 3] = ["transcript", "response", "item"];

/// Classify the speaker of an event that is not self-describing by type.
///
/// Checks each role-ish field at the top level, then one level down
/// inside known sub-objects; the first non-empty string found decides.
/// Returns `None` when no field resolves — callers fall back to the
/// first-utterance heuristic.
pub fn classify_role(value: &Value) -> Option<Role> {
    for field in ROLE_FIELDS {
        if let Some(label) = non_empty_str(value.get(field)) {
            return Some(role_from_label(label));
        }
    }
    for nest in ROLE_NESTS {
        if let Some(inner) = value.get(nest) {
            for field in ROLE_FIELDS {
                if let Some(label) = non_empty_str(inner.get(field)) {
                    return Some(role_from_label(label));
                }
            }
        }
    }
    None
}

fn role_from_label(label: &str) -> Role {
    let label = label.to_lowercase();
    for marker in ["user", "input", "local", "client", "human", "mic"] {
        if label.contains(marker) {
            return Role::User;
        }
    }
    Role::Agent
}

// ── Tests ─────────────────────────────────────────────────────────
