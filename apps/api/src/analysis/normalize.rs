//! Lenient readers that turn a parsed remote payload into an `AnalysisResult`.
//!
//! The model's field names drift between prompts (`aiSummary`, `assessment`,
//! `overallScore`, `improvements`), so every read goes through the alias table.
//! Anything missing or mistyped falls back to the local baseline.

use serde_json::{Map, Value};

use crate::heuristics::info::MAX_EXPERIENCE_YEARS;
use crate::models::analysis::{
    clamp_score, AnalysisMode, AnalysisResult, CandidateInfo, GapAnalysis, LearningStep, Verdict,
};

const ALIASES: &[(&str, &[&str])] = &[
    ("score", &["score", "overallScore", "matchScore"]),
    ("summary", &["summary", "aiSummary", "assessment"]),
    ("weaknesses", &["weaknesses", "improvements", "areasForImprovement"]),
];

/// The object to read from. A top-level array yields its first object.
pub fn root_object(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.iter().find_map(Value::as_object),
        _ => None,
    }
}

/// Looks `field` up under its canonical name and every alias, skipping nulls.
pub fn lookup<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    let aliases = ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == field)
        .map(|(_, names)| *names);

    match aliases {
        Some(names) => names
            .iter()
            .filter_map(|name| obj.get(*name))
            .find(|v| !v.is_null()),
        None => obj.get(field).filter(|v| !v.is_null()),
    }
}

/// True when the payload is an object carrying every required field.
/// A `score` must be numeric (or a numeric string) to count.
pub fn meets_required(value: &Value, required: &[&str]) -> bool {
    let Some(obj) = root_object(value) else {
        return false;
    };

    required.iter().all(|field| match lookup(obj, field) {
        Some(v) if *field == "score" => read_number(v).is_some(),
        Some(_) => true,
        None => false,
    })
}

/// Builds the final result: remote fields win, the baseline fills the rest.
pub fn normalize(
    value: &Value,
    baseline: AnalysisResult,
    mode: AnalysisMode,
    reports_verdict: bool,
) -> AnalysisResult {
    let Some(obj) = root_object(value) else {
        return AnalysisResult { mode, ..baseline };
    };

    let score = lookup(obj, "score")
        .and_then(read_number)
        .map(clamp_score)
        .unwrap_or(baseline.score);

    let status = if reports_verdict {
        lookup(obj, "status")
            .and_then(Value::as_str)
            .and_then(Verdict::parse)
            .unwrap_or_else(|| Verdict::from_score(score))
    } else {
        Verdict::from_score(score)
    };

    AnalysisResult {
        score,
        strengths: read_list(obj, "strengths").unwrap_or(baseline.strengths),
        weaknesses: read_list(obj, "weaknesses").unwrap_or(baseline.weaknesses),
        recommendations: read_list(obj, "recommendations").unwrap_or(baseline.recommendations),
        summary: lookup(obj, "summary")
            .and_then(read_text)
            .unwrap_or(baseline.summary),
        extracted_info: match lookup(obj, "extractedInfo").and_then(Value::as_object) {
            Some(info) => merge_info(info, baseline.extracted_info),
            None => baseline.extracted_info,
        },
        gap_analysis: match lookup(obj, "gapAnalysis").and_then(Value::as_object) {
            Some(gaps) => GapAnalysis {
                missing_skills: read_list(gaps, "missingSkills")
                    .unwrap_or(baseline.gap_analysis.missing_skills),
                experience_gaps: read_list(gaps, "experienceGaps")
                    .unwrap_or(baseline.gap_analysis.experience_gaps),
            },
            None => baseline.gap_analysis,
        },
        learning_path: lookup(obj, "learningPath")
            .and_then(read_learning_path)
            .unwrap_or(baseline.learning_path),
        status,
        mode,
    }
}

/// The parts of an earlier resume analysis an interviewer prompt cites.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeHighlights {
    pub experience: u32,
    pub skills: Vec<String>,
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub summary: Option<String>,
}

/// Reads a caller-supplied analysis (ours or an older client's shape).
/// `None` when the value carries no object.
pub fn resume_highlights(value: &Value) -> Option<ResumeHighlights> {
    let obj = root_object(value)?;
    let info = lookup(obj, "extractedInfo").and_then(Value::as_object);

    Some(ResumeHighlights {
        experience: info
            .and_then(|i| lookup(i, "experience"))
            .and_then(read_years)
            .unwrap_or(0),
        skills: info
            .and_then(|i| read_list(i, "skills"))
            .unwrap_or_default(),
        score: lookup(obj, "score")
            .and_then(read_number)
            .map(clamp_score)
            .unwrap_or(0),
        strengths: read_list(obj, "strengths").unwrap_or_default(),
        weaknesses: read_list(obj, "weaknesses").unwrap_or_default(),
        summary: lookup(obj, "summary").and_then(read_text),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Field readers
// ────────────────────────────────────────────────────────────────────────────

/// Finite numbers only; `"NaN"` and `"inf"` strings do not count as scores.
fn read_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Whole years, clamped to the same range the local extractor uses.
fn read_years(value: &Value) -> Option<u32> {
    read_number(value).map(|n| n.round().clamp(0.0, MAX_EXPERIENCE_YEARS as f64) as u32)
}

fn read_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Arrays keep their non-blank text items; a lone string becomes a one-item list.
fn read_list(obj: &Map<String, Value>, field: &str) -> Option<Vec<String>> {
    match lookup(obj, field)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(_) | Value::Array(_) => Some(item.to_string()),
                    other => read_text(other),
                })
                .collect(),
        ),
        other => read_text(other).map(|s| vec![s]),
    }
}

fn merge_info(obj: &Map<String, Value>, baseline: CandidateInfo) -> CandidateInfo {
    let text = |field: &str, fallback: String| {
        lookup(obj, field).and_then(read_text).unwrap_or(fallback)
    };

    let mut skills = read_list(obj, "skills").unwrap_or_default();
    let mut seen: Vec<String> = Vec::new();
    skills.retain(|s| {
        let key = s.to_lowercase();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });

    CandidateInfo {
        name: text("name", baseline.name),
        email: text("email", baseline.email),
        phone: text("phone", baseline.phone),
        experience: lookup(obj, "experience")
            .and_then(read_years)
            .unwrap_or(baseline.experience),
        skills: if skills.is_empty() {
            baseline.skills
        } else {
            skills
        },
        education: text("education", baseline.education),
        location: text("location", baseline.location),
    }
}

fn read_learning_path(value: &Value) -> Option<Vec<LearningStep>> {
    let steps: Vec<LearningStep> = value
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|step| {
            let title = lookup(step, "title").and_then(read_text)?;
            Some(LearningStep {
                title,
                description: lookup(step, "description")
                    .and_then(read_text)
                    .unwrap_or_default(),
                resources: read_list(step, "resources").unwrap_or_default(),
                estimated_time: lookup(step, "estimatedTime")
                    .and_then(read_text)
                    .unwrap_or_default(),
            })
        })
        .collect();

    (!steps.is_empty()).then_some(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::{KeywordHeuristicAnalyzer, LocalAnalyzer};
    use serde_json::json;

    fn baseline() -> AnalysisResult {
        KeywordHeuristicAnalyzer.analyze("Dana Whitfield\n5 years of python", None)
    }

    #[test]
    fn test_meets_required_with_aliases() {
        let review = json!({ "overallScore": 81, "strengths": [] });
        assert!(meets_required(&review, &["score"]));

        let critique = json!({ "score": "72", "improvements": ["x"], "assessment": "ok" });
        assert!(meets_required(&critique, &["score", "weaknesses", "summary"]));
    }

    #[test]
    fn test_meets_required_rejects_missing_or_non_numeric_score() {
        assert!(!meets_required(&json!({ "strengths": [] }), &["score"]));
        assert!(!meets_required(&json!({ "score": "high" }), &["score"]));
        assert!(!meets_required(&json!({ "score": null }), &["score"]));
        assert!(!meets_required(&json!({ "score": "NaN" }), &["score"]));
        assert!(!meets_required(&json!("text"), &["score"]));
        assert!(!meets_required(&json!({ "score": 5 }), &["score", "status"]));
    }

    #[test]
    fn test_array_root_uses_first_object() {
        let value = json!([1, { "score": 90 }]);
        assert!(meets_required(&value, &["score"]));
    }

    #[test]
    fn test_normalize_clamps_and_fills_from_baseline() {
        let value = json!({ "score": 140, "strengths": ["Leadership"], "weaknesses": "Testing" });
        let base = baseline();
        let result = normalize(&value, base.clone(), AnalysisMode::RemoteStructured, false);

        assert_eq!(result.score, 100);
        assert_eq!(result.strengths, vec!["Leadership"]);
        assert_eq!(result.weaknesses, vec!["Testing"]);
        assert_eq!(result.recommendations, base.recommendations);
        assert_eq!(result.summary, base.summary);
        assert_eq!(result.extracted_info, base.extracted_info);
        assert_eq!(result.status, Verdict::Recommended);
        assert_eq!(result.mode, AnalysisMode::RemoteStructured);
    }

    #[test]
    fn test_normalize_reads_aliases_and_verdict() {
        let value = json!({
            "score": 55.4,
            "aiSummary": "  Solid answers.  ",
            "improvements": ["Depth"],
            "status": "recommended"
        });
        let result = normalize(&value, baseline(), AnalysisMode::RemoteText, true);
        assert_eq!(result.score, 55);
        assert_eq!(result.summary, "Solid answers.");
        assert_eq!(result.weaknesses, vec!["Depth"]);
        assert_eq!(result.status, Verdict::Recommended);

        // Unknown verdict text falls back to the score.
        let value = json!({ "score": 55, "status": "maybe" });
        let result = normalize(&value, baseline(), AnalysisMode::RemoteText, true);
        assert_eq!(result.status, Verdict::Rejected);
    }

    #[test]
    fn test_verdict_ignored_when_use_case_does_not_report_one() {
        let value = json!({ "score": 90, "status": "Rejected" });
        let result = normalize(&value, baseline(), AnalysisMode::RemoteText, false);
        assert_eq!(result.status, Verdict::Recommended);
    }

    #[test]
    fn test_merge_info_keeps_baseline_for_missing_fields() {
        let value = json!({
            "score": 70,
            "extractedInfo": {
                "email": "dana@example.com",
                "experience": "7",
                "skills": ["Rust", "rust", " Go "],
                "location": null
            }
        });
        let base = baseline();
        let result = normalize(&value, base.clone(), AnalysisMode::RemoteStructured, false);
        let info = result.extracted_info;

        assert_eq!(info.name, base.extracted_info.name);
        assert_eq!(info.email, "dana@example.com");
        assert_eq!(info.experience, 7);
        assert_eq!(info.skills, vec!["Rust", "Go"]);
        assert_eq!(info.location, base.extracted_info.location);
    }

    #[test]
    fn test_remote_experience_is_clamped() {
        let years = |raw: Value| {
            let value = json!({ "score": 70, "extractedInfo": { "experience": raw } });
            normalize(&value, baseline(), AnalysisMode::RemoteText, false)
                .extracted_info
                .experience
        };
        assert_eq!(years(json!(99)), MAX_EXPERIENCE_YEARS);
        assert_eq!(years(json!(-3)), 0);
        assert_eq!(years(json!("12.6")), 13);
    }

    #[test]
    fn test_resume_highlights_reads_client_shape() {
        let value = json!({
            "score": 82,
            "strengths": ["APIs"],
            "improvements": ["Testing"],
            "aiSummary": "Strong backend profile",
            "extractedInfo": { "experience": 75, "skills": ["Go", "SQL"] }
        });
        let highlights = resume_highlights(&value).unwrap();

        assert_eq!(highlights.score, 82);
        assert_eq!(highlights.experience, MAX_EXPERIENCE_YEARS);
        assert_eq!(highlights.skills, vec!["Go", "SQL"]);
        assert_eq!(highlights.weaknesses, vec!["Testing"]);
        assert_eq!(highlights.summary.as_deref(), Some("Strong backend profile"));
    }

    #[test]
    fn test_resume_highlights_defaults() {
        let highlights = resume_highlights(&json!({})).unwrap();
        assert_eq!(highlights.score, 0);
        assert_eq!(highlights.experience, 0);
        assert!(highlights.skills.is_empty());
        assert_eq!(highlights.summary, None);

        assert_eq!(resume_highlights(&json!("text")), None);
    }

    #[test]
    fn test_learning_path_requires_titles() {
        let value = json!({
            "score": 70,
            "learningPath": [
                { "title": "Learn Kubernetes", "resources": ["k8s docs"], "estimatedTime": "2 weeks" },
                { "description": "no title" }
            ]
        });
        let result = normalize(&value, baseline(), AnalysisMode::RemoteStructured, false);
        assert_eq!(result.learning_path.len(), 1);
        assert_eq!(result.learning_path[0].title, "Learn Kubernetes");
        assert_eq!(result.learning_path[0].description, "");

        let value = json!({ "score": 70, "learningPath": [{ "description": "x" }] });
        let base = baseline();
        let result = normalize(&value, base.clone(), AnalysisMode::RemoteStructured, false);
        assert_eq!(result.learning_path, base.learning_path);
    }

    #[test]
    fn test_non_object_payload_returns_baseline_with_mode() {
        let base = baseline();
        let result = normalize(&json!(42), base.clone(), AnalysisMode::RemoteText, false);
        assert_eq!(result.score, base.score);
        assert_eq!(result.mode, AnalysisMode::RemoteText);
    }
}
