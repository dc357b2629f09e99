//! Keyword match scoring of a resume against a job description.
//!
//! Algorithm:
//! 1. Tokenize the lowercased JD on `[^a-z0-9+#.]+`, keep tokens longer than 2, dedup
//! 2. A token present anywhere in the lowercased resume is a match;
//!    important skills weigh 2, everything else 1
//! 3. base = min(95, round(matches / max(10, n) * 70) + min(25, weighted))
//! 4. score = max(50, base), so the result always lies in 50..=95

use once_cell::sync::Lazy;
use regex::Regex;

const IMPORTANT_SKILLS: &[&str] = &[
    "react", "node", "typescript", "javascript", "python", "java", "aws", "docker",
    "kubernetes", "sql", "mongodb",
];

pub const MIN_MATCH_SCORE: u8 = 50;
pub const MAX_MATCH_SCORE: u8 = 95;

const MIN_TOKEN_DENOMINATOR: usize = 10;
const MAX_WEIGHTED_BONUS: usize = 25;
const HIGHLIGHT_COUNT: usize = 3;

static TOKEN_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9+#.]+").expect("valid token split regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    /// 50 – 95
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

pub fn compute_match_score(resume_text: &str, job_description: &str) -> MatchScore {
    let resume = resume_text.to_lowercase();
    let tokens = tokenize(&job_description.to_lowercase());

    let (matched, missing): (Vec<String>, Vec<String>) =
        tokens.into_iter().partition(|t| resume.contains(t.as_str()));

    let weighted: usize = matched
        .iter()
        .map(|t| if IMPORTANT_SKILLS.contains(&t.as_str()) { 2 } else { 1 })
        .sum();

    let total = matched.len() + missing.len();
    let ratio = matched.len() as f64 / total.max(MIN_TOKEN_DENOMINATOR) as f64;
    let coverage = (ratio * 70.0).round() as usize;
    let base = (coverage + weighted.min(MAX_WEIGHTED_BONUS)).min(MAX_MATCH_SCORE as usize);
    let score = (base as u8).max(MIN_MATCH_SCORE);

    let strengths = matched
        .iter()
        .take(HIGHLIGHT_COUNT)
        .map(|t| format!("Experience with {t}"))
        .collect();
    let weaknesses = missing
        .iter()
        .take(HIGHLIGHT_COUNT)
        .map(|t| format!("Limited evidence of {t}"))
        .collect();

    MatchScore {
        score,
        strengths,
        weaknesses,
    }
}

/// Distinct tokens longer than two characters, in first-seen order.
fn tokenize(lower: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in TOKEN_SPLIT.split(lower).filter(|t| t.chars().count() > 2) {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}
