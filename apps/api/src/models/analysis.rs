use serde::{Deserialize, Serialize};

/// Candidate details pulled from a resume. Built fresh per analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Years of experience.
    pub experience: u32,
    pub skills: Vec<String>,
    pub education: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub missing_skills: Vec<String>,
    pub experience_gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStep {
    pub title: String,
    pub description: String,
    pub resources: Vec<String>,
    pub estimated_time: String,
}

/// Hiring verdict. Interview grading reports it directly; every other use
/// case derives it from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Recommended,
    Consider,
    Rejected,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Verdict::Recommended,
            65..=79 => Verdict::Consider,
            _ => Verdict::Rejected,
        }
    }

    /// Case-insensitive match on the verdict name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "recommended" => Some(Verdict::Recommended),
            "consider" => Some(Verdict::Consider),
            "rejected" => Some(Verdict::Rejected),
            _ => None,
        }
    }
}

/// Which tier of the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisMode {
    RemoteStructured,
    RemoteText,
    Local,
}

/// The single shape every analysis use case returns.
///
/// Total: every field is populated on every path, with deterministic
/// placeholder content where no real content exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 0 – 100
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub summary: String,
    pub extracted_info: CandidateInfo,
    pub gap_analysis: GapAnalysis,
    pub learning_path: Vec<LearningStep>,
    pub status: Verdict,
    pub mode: AnalysisMode,
}

/// Clamps any numeric score into `0..=100`; NaN maps to 0.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}
