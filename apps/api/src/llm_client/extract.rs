//! Response text extraction.
//!
//! The remote success payload is not shape-stable: text may sit at the top
//! level, under `response`, inside `candidates[0].content.parts[0]`, or under
//! a bare `content`. The body is decoded into typed envelopes whose fields are
//! all optional, then checked in a fixed order. Each location decodes on its
//! own: a mistyped sibling only disables its own path.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A text-bearing node: either key may hold the payload.
#[derive(Debug, Default, Deserialize)]
struct TextSlot {
    #[serde(default)]
    output_text: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default, deserialize_with = "lenient")]
    parts: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default, deserialize_with = "lenient")]
    content: Option<Content>,
    #[serde(flatten)]
    slot: TextSlot,
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(flatten)]
    slot: TextSlot,
    #[serde(default, deserialize_with = "lenient")]
    response: Option<TextSlot>,
    #[serde(default, deserialize_with = "lenient")]
    candidates: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    content: Option<Content>,
}

/// Any JSON is accepted; a value of the wrong shape decodes to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Known response variants, in lookup order.
#[derive(Debug, PartialEq)]
pub enum ResponseShape {
    /// The body itself is a string.
    Plain(String),
    /// `output_text` / `text` at the top level.
    Direct(String),
    /// `response.output_text` / `response.text`.
    Wrapped(String),
    /// `candidates[0].content.parts[0]`.
    CandidatePart(String),
    /// `candidates[0].output_text` / `candidates[0].text`.
    CandidateDirect(String),
    /// `content.parts[0]`.
    ContentPart(String),
    /// An object that already looks like an analysis (`score` or `strengths`).
    SchemaShaped(String),
    Unrecognized,
}

impl ResponseShape {
    /// Decodes a response body into the first variant that yields non-empty text.
    pub fn decode(response: &Value) -> Self {
        if let Value::String(s) = response {
            let trimmed = s.trim();
            return if trimmed.is_empty() {
                ResponseShape::Unrecognized
            } else {
                ResponseShape::Plain(trimmed.to_string())
            };
        }

        if !response.is_object() {
            return ResponseShape::Unrecognized;
        }

        let envelope: Envelope = Envelope::deserialize(response).unwrap_or_default();

        if let Some(text) = slot_text(&envelope.slot) {
            return ResponseShape::Direct(text);
        }
        if let Some(text) = envelope.response.as_ref().and_then(slot_text) {
            return ResponseShape::Wrapped(text);
        }
        let candidate = envelope
            .candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|first| Candidate::deserialize(first).ok());
        if let Some(candidate) = candidate {
            if let Some(text) = candidate.content.as_ref().and_then(first_part_text) {
                return ResponseShape::CandidatePart(text);
            }
            if let Some(text) = slot_text(&candidate.slot) {
                return ResponseShape::CandidateDirect(text);
            }
        }
        if let Some(text) = envelope.content.as_ref().and_then(first_part_text) {
            return ResponseShape::ContentPart(text);
        }

        if response.get("score").is_some() || response.get("strengths").is_some() {
            return ResponseShape::SchemaShaped(response.to_string());
        }

        ResponseShape::Unrecognized
    }

    pub fn into_text(self) -> String {
        match self {
            ResponseShape::Plain(t)
            | ResponseShape::Direct(t)
            | ResponseShape::Wrapped(t)
            | ResponseShape::CandidatePart(t)
            | ResponseShape::CandidateDirect(t)
            | ResponseShape::ContentPart(t)
            | ResponseShape::SchemaShaped(t) => t,
            ResponseShape::Unrecognized => String::new(),
        }
    }
}

/// Normalizes any response body into a text payload. Empty string means
/// "no usable output".
pub fn extract_text(response: &Value) -> String {
    ResponseShape::decode(response).into_text()
}

fn first_part_text(content: &Content) -> Option<String> {
    let part = content.parts.as_ref()?.first()?;
    slot_text(&TextSlot::deserialize(part).ok()?)
}

fn slot_text(slot: &TextSlot) -> Option<String> {
    [&slot.output_text, &slot.text]
        .into_iter()
        .flatten()
        .find_map(render)
}

/// Strings as-is, objects and arrays serialized; blanks and scalars are skipped.
fn render(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
        _ => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
