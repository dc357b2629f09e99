//! Structured Text Parser — best-effort JSON recovery from model output.
//!
//! Model answers are frequently *almost* JSON: wrapped in prose, fenced in
//! markdown, or carrying trailing commas, comments and unquoted keys. `parse`
//! applies increasingly aggressive strategies and stops at the first success:
//!
//! 1. strip code fences and whitespace
//! 2. trim to the outermost `{...}` or `[...]` span
//! 3. strict parse
//! 4. balanced scan for the first self-contained object, then array (unless
//!    the array only sits inside an object that failed to parse)
//! 5. repair pass (see `repair`), strict parse
//! 6. greedy `{...}` regex span without trailing commas
//!
//! Pure and deterministic: no I/O, no clock.

pub mod balanced;
pub mod repair;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use self::balanced::{extract_balanced_array, extract_balanced_object};
use self::repair::{repair, strip_trailing_commas};

static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("valid leading fence regex"));

static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*```\s*$").expect("valid trailing fence regex"));

static GREEDY_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid greedy object regex"));

/// Result of a parse: a complete JSON tree or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStructure {
    Parsed(Value),
    Absent,
}

impl ParsedStructure {
    pub fn into_value(self) -> Option<Value> {
        match self {
            ParsedStructure::Parsed(v) => Some(v),
            ParsedStructure::Absent => None,
        }
    }
}

/// Which strategy recovered the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Direct,
    BalancedObject,
    BalancedArray,
    Repaired,
    GreedySpan,
}

/// Parses model output into a JSON structure, or `Absent`.
pub fn parse(raw: &str) -> ParsedStructure {
    match parse_with_stage(raw) {
        Some((value, stage)) => {
            debug!("Structured parse succeeded at stage {stage:?}");
            ParsedStructure::Parsed(value)
        }
        None => {
            debug!(
                "Structured parse failed for input starting {:?}",
                raw.chars().take(120).collect::<String>()
            );
            ParsedStructure::Absent
        }
    }
}

/// Like `parse`, but reports the stage that succeeded.
pub fn parse_with_stage(raw: &str) -> Option<(Value, ParseStage)> {
    let stripped = strip_fences(raw);
    if stripped.is_empty() {
        return None;
    }
    let cleaned = trim_to_span(stripped);

    if let Some(value) = strict(cleaned) {
        return Some((value, ParseStage::Direct));
    }

    let object_span = extract_balanced_object(cleaned);
    if let Some(value) = object_span.and_then(strict) {
        return Some((value, ParseStage::BalancedObject));
    }

    // An array nested inside a broken object is a fragment, not the answer.
    if cleaned.starts_with('[') || object_span.is_none() {
        if let Some(value) = extract_balanced_array(cleaned).and_then(strict) {
            return Some((value, ParseStage::BalancedArray));
        }
    }

    if let Some(value) = strict(&repair(cleaned)) {
        return Some((value, ParseStage::Repaired));
    }

    GREEDY_OBJECT
        .find(cleaned)
        .and_then(|m| strict(&strip_trailing_commas(m.as_str())))
        .map(|value| (value, ParseStage::GreedySpan))
}

fn strict(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Removes surrounding markdown fences, whitespace and a byte-order mark.
fn strip_fences(raw: &str) -> &str {
    let text = raw.trim().trim_start_matches('\u{feff}').trim();
    let start = LEADING_FENCE.find(text).map_or(0, |m| m.end());
    let text = &text[start..];
    let end = TRAILING_FENCE.find(text).map_or(text.len(), |m| m.start());
    text[..end].trim()
}

/// Narrows the text to the span from the first opener to the last closer of
/// the same kind. Object vs array is decided by whichever opener comes first.
fn trim_to_span(text: &str) -> &str {
    let first_object = text.find('{');
    let first_array = text.find('[');

    let (start, closer) = match (first_object, first_array) {
        (Some(o), Some(a)) if o < a => (o, '}'),
        (Some(o), None) => (o, '}'),
        (_, Some(a)) => (a, ']'),
        (None, None) => return text,
    };

    let rest = &text[start..];
    match rest.rfind(closer) {
        Some(end) => &rest[..=end],
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(raw: &str) -> Value {
        parse(raw).into_value().expect("expected a parsed structure")
    }

    #[test]
    fn test_plain_json() {
        assert_eq!(parsed(r#"{"score": 80}"#), json!({ "score": 80 }));
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"score\": 72, \"strengths\": [\"Rust\"]}\n```";
        assert_eq!(
            parse_with_stage(raw).map(|(_, s)| s),
            Some(ParseStage::Direct)
        );
        assert_eq!(parsed(raw), json!({ "score": 72, "strengths": ["Rust"] }));
    }

    #[test]
    fn test_uppercase_fence_without_language() {
        assert_eq!(parsed("```JSON\n[1, 2]\n```"), json!([1, 2]));
        assert_eq!(parsed("```\n{\"a\": true}\n```"), json!({ "a": true }));
    }

    #[test]
    fn test_prose_wrapped_object_with_nested_brace_in_string() {
        let raw = r#"Here is your answer: {"score": 10, "note": "a {nested} brace"} thanks!"#;
        assert_eq!(
            parsed(raw),
            json!({ "score": 10, "note": "a {nested} brace" })
        );
    }

    #[test]
    fn test_two_objects_uses_balanced_scan() {
        let raw = r#"First {"score": 61} then {"score": 99}"#;
        assert_eq!(
            parse_with_stage(raw),
            Some((json!({ "score": 61 }), ParseStage::BalancedObject))
        );
    }

    #[test]
    fn test_array_with_trailing_prose() {
        let raw = r#"Sure! ["Tell me about Rust", "Describe a project"] Good luck."#;
        assert_eq!(
            parsed(raw),
            json!(["Tell me about Rust", "Describe a project"])
        );
    }

    #[test]
    fn test_array_first_object_later() {
        // Array opener comes first, so the span closes at the last `]`.
        let raw = r#"["a", {"b": 1}] trailing {"c": 2}"#;
        assert_eq!(parsed(raw), json!(["a", { "b": 1 }]));
    }

    #[test]
    fn test_inner_array_of_broken_object_is_not_returned() {
        let raw = r#"{"score": 77, "strengths": ["SQL"], "weaknesses": [],}"#;
        let (value, stage) = parse_with_stage(raw).unwrap();
        assert_eq!(stage, ParseStage::Repaired);
        assert_eq!(value["score"], 77);
    }

    #[test]
    fn test_repair_stage_handles_model_quirks() {
        let raw = "Result:\n{\n  score: 64, // out of 100\n  'summary': 'Decent fit',\n  extra: NaN,\n  strengths: ['Go', 'SQL',],\n}";
        let (value, stage) = parse_with_stage(raw).unwrap();
        assert_eq!(stage, ParseStage::Repaired);
        assert_eq!(
            value,
            json!({
                "score": 64,
                "summary": "Decent fit",
                "extra": null,
                "strengths": ["Go", "SQL"]
            })
        );
    }

    #[test]
    fn test_trailing_comma_only() {
        assert_eq!(
            parsed(r#"{"score": 50, "weaknesses": ["x",],}"#),
            json!({ "score": 50, "weaknesses": ["x"] })
        );
    }

    #[test]
    fn test_unparseable_returns_absent() {
        assert_eq!(parse("I could not evaluate this resume."), ParsedStructure::Absent);
        assert_eq!(parse("{ this is : not [ json"), ParsedStructure::Absent);
        assert_eq!(parse(""), ParsedStructure::Absent);
        assert_eq!(parse("   ```json\n```  "), ParsedStructure::Absent);
    }

    #[test]
    fn test_deterministic() {
        let raw = "text {score: 1,} more";
        assert_eq!(parse(raw), parse(raw));
    }

    #[test]
    fn test_reserialized_output_round_trips() {
        let inputs = [
            r#"{"score": 10, "note": "a {nested} brace"}"#,
            "```json\n{\"a\": [1, 2, {\"b\": null}]}\n```",
            "prefix {score: 3, tags: ['x',],} suffix",
            r#"["q1", "q2"]"#,
        ];
        for raw in inputs {
            let first = parsed(raw);
            let again = parsed(&first.to_string());
            assert_eq!(first, again, "round trip failed for {raw}");
        }
    }

    #[test]
    fn test_strip_fences_only_touches_edges() {
        assert_eq!(strip_fences("```json\n{\"a\":\"```\"}\n```"), "{\"a\":\"```\"}");
    }

    #[test]
    fn test_trim_to_span_without_closer() {
        assert_eq!(trim_to_span("abc {\"a\": 1"), "{\"a\": 1");
        assert_eq!(trim_to_span("no json"), "no json");
    }
}
