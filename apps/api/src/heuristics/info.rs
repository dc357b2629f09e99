//! Candidate info extraction — regex and vocabulary based, never fails.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::analysis::CandidateInfo;

pub const UNKNOWN_NAME: &str = "Unknown Candidate";
pub const NOT_FOUND: &str = "Not found";
pub const NOT_SPECIFIED: &str = "Not specified";

pub const MAX_EXPERIENCE_YEARS: u32 = 40;
const NAME_SCAN_LINES: usize = 10;
const MIN_PHONE_DIGITS: usize = 9;

/// Curated skill vocabulary matched by substring against the lowercased text.
pub const KNOWN_SKILLS: &[&str] = &[
    "javascript", "typescript", "react", "node", "node.js", "python", "java", "c++", "c#",
    "go", "ruby", "php", "swift", "kotlin", "html", "css", "tailwind", "next", "angular",
    "vue", "express", "django", "flask", "spring", "mongodb", "postgres", "mysql", "sql",
    "redis", "graphql", "aws", "azure", "gcp", "docker", "kubernetes", "git", "ci/cd",
    "jest", "pytest", "junit",
];

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").expect("valid email regex")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s\-()]{8,}\d").expect("valid phone regex"));

static YEARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\s+years?").expect("valid years regex"));

static HUMAN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z\s.'-]{4,}$").expect("valid name regex"));

/// Extracts candidate details from plain resume text.
pub fn extract_candidate_info(text: &str) -> CandidateInfo {
    let lower = text.to_lowercase();

    CandidateInfo {
        name: extract_name(text),
        email: EMAIL
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| NOT_FOUND.to_string()),
        phone: extract_phone(text).unwrap_or_else(|| NOT_FOUND.to_string()),
        experience: extract_experience_years(&lower),
        skills: extract_skills(&lower),
        education: NOT_SPECIFIED.to_string(),
        location: NOT_SPECIFIED.to_string(),
    }
}

/// First phone-looking run with at least nine digits.
fn extract_phone(text: &str) -> Option<String> {
    PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            candidate.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
        })
        .map(String::from)
}

/// First `"<N> year(s)"` mention, clamped to 0–40. Expects lowercased text.
fn extract_experience_years(lower: &str) -> u32 {
    YEARS
        .captures(lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|years| years.min(MAX_EXPERIENCE_YEARS))
        .unwrap_or(0)
}

/// Vocabulary hits in vocabulary order, `node.js` folded into `node`, deduped.
/// Expects lowercased text.
pub fn extract_skills(lower: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for skill in KNOWN_SKILLS.iter().filter(|s| lower.contains(*s)) {
        let normalized = if *skill == "node.js" { "node" } else { skill };
        if !skills.iter().any(|s| s == normalized) {
            skills.push(normalized.to_string());
        }
    }
    skills
}

/// First of the leading non-empty lines that looks like a human name.
fn extract_name(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(NAME_SCAN_LINES)
        .find(|line| HUMAN_NAME.is_match(line) && !line.to_lowercase().contains("resume"))
        .map(String::from)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Curriculum Vitae 2024\n\
        Jane Q. Doe\n\
        jane.doe@example.com | +1 (555) 123-4567\n\
        Senior engineer with 7 years of experience in Python, Node.js and AWS.\n\
        Built Docker based CI/CD pipelines.";

    #[test]
    fn test_extracts_all_fields() {
        let info = extract_candidate_info(RESUME);
        assert_eq!(info.name, "Jane Q. Doe");
        assert_eq!(info.email, "jane.doe@example.com");
        assert_eq!(info.phone, "+1 (555) 123-4567");
        assert_eq!(info.experience, 7);
        assert!(info.skills.contains(&"python".to_string()));
        assert!(info.skills.contains(&"node".to_string()));
        assert!(info.skills.contains(&"aws".to_string()));
        assert!(info.skills.contains(&"docker".to_string()));
        assert!(info.skills.contains(&"ci/cd".to_string()));
        assert_eq!(info.education, NOT_SPECIFIED);
        assert_eq!(info.location, NOT_SPECIFIED);
    }

    #[test]
    fn test_node_js_folded_and_deduped() {
        let skills = extract_skills("node.js and node");
        assert_eq!(skills.iter().filter(|s| *s == "node").count(), 1);
        assert!(!skills.contains(&"node.js".to_string()));
    }

    #[test]
    fn test_defaults_when_nothing_matches() {
        let info = extract_candidate_info("");
        assert_eq!(info.name, UNKNOWN_NAME);
        assert_eq!(info.email, NOT_FOUND);
        assert_eq!(info.phone, NOT_FOUND);
        assert_eq!(info.experience, 0);
        assert!(info.skills.is_empty());
    }

    #[test]
    fn test_experience_clamped_to_forty() {
        assert_eq!(extract_experience_years("over 55 years in industry"), 40);
        assert_eq!(extract_experience_years("1 year"), 1);
        assert_eq!(extract_experience_years("many years"), 0);
    }

    #[test]
    fn test_short_digit_runs_are_not_phones() {
        assert_eq!(extract_phone("Zip 12-34-56-7 only"), None);
        assert_eq!(
            extract_phone("call 020 7946 0958 now").as_deref(),
            Some("020 7946 0958")
        );
    }

    #[test]
    fn test_name_skips_resume_heading_and_short_lines() {
        let text = "RESUME of candidate\nBob\nMaria Garcia-Lopez\n";
        assert_eq!(extract_name(text), "Maria Garcia-Lopez");
    }

    #[test]
    fn test_name_only_scans_first_ten_lines() {
        let mut text = String::new();
        for i in 0..10 {
            text.push_str(&format!("line {i}\n"));
        }
        text.push_str("Late Name Here\n");
        assert_eq!(extract_name(&text), UNKNOWN_NAME);
    }
}
