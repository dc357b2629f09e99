//! Local Heuristic Analyzer — offline, deterministic analysis that produces the
//! same `AnalysisResult` shape as the remote model.
//!
//! Default: `KeywordHeuristicAnalyzer` (regex extraction + keyword match scoring).
//! The orchestrator holds an `Arc<dyn LocalAnalyzer>` and calls it as the
//! terminal tier of every fallback chain. Nothing in here can fail.

pub mod info;
pub mod scoring;

use crate::models::analysis::{
    AnalysisMode, AnalysisResult, CandidateInfo, GapAnalysis, LearningStep, Verdict,
};

use self::info::extract_candidate_info;
use self::scoring::compute_match_score;

/// First missing-skills entry of every locally produced result.
pub const LOCAL_MODE_MARKER: &str = "Advanced skills analysis unavailable (Local Mode)";
const EXPERIENCE_GAP_PLACEHOLDER: &str = "Detailed experience gap analysis requires AI";

/// Score used for resume scoring when no job description is supplied.
pub const NO_JD_SCORE: u8 = 65;
pub const REVIEW_SCORE: u8 = 75;
pub const INTERVIEW_SCORE: u8 = 70;
pub const CRITIQUE_SCORE: u8 = 75;

const TOP_SKILLS: usize = 5;
const QUESTIONS_PER_SET: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The local analyzer trait. One method per use case; every method is total.
///
/// Carried by the orchestrator as `Arc<dyn LocalAnalyzer>`.
pub trait LocalAnalyzer: Send + Sync {
    /// Resume scoring, optionally against a job description.
    fn analyze(&self, resume_text: &str, job_description: Option<&str>) -> AnalysisResult;

    /// General job-seeker review (no job description).
    fn review(&self, resume_text: &str) -> AnalysisResult;

    fn grade_interview(&self, transcript: &str, candidate_name: &str) -> AnalysisResult;

    fn critique_response(&self, question: &str, response: &str) -> AnalysisResult;

    /// Screening questions when the model cannot write them.
    fn interview_questions(&self, skills: &[String]) -> Vec<String>;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordHeuristicAnalyzer — default implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct KeywordHeuristicAnalyzer;

impl LocalAnalyzer for KeywordHeuristicAnalyzer {
    fn analyze(&self, resume_text: &str, job_description: Option<&str>) -> AnalysisResult {
        let info = extract_candidate_info(resume_text);

        let (score, strengths, weaknesses) =
            match job_description.filter(|jd| !jd.trim().is_empty()) {
                Some(jd) => {
                    let report = compute_match_score(resume_text, jd);
                    (report.score, report.strengths, report.weaknesses)
                }
                None => (NO_JD_SCORE, vec![], vec![]),
            };

        let strengths = non_empty_or(
            strengths,
            &["Strong technical background", "Relevant experience"],
        );
        let weaknesses = non_empty_or(weaknesses, &["Could improve in specific areas"]);

        let summary = format!(
            "Estimated {} years experience. Top skills: {}",
            info.experience,
            top_skills(&info).unwrap_or_else(|| "none detected".to_string())
        );

        local_result(
            score,
            strengths,
            weaknesses,
            vec![fit_recommendation(score).to_string()],
            summary,
            info,
        )
    }

    fn review(&self, resume_text: &str) -> AnalysisResult {
        let info = extract_candidate_info(resume_text);
        let skills = top_skills(&info);

        let skills_strength = match &skills {
            Some(list) => format!("Strong technical skills: {list}"),
            None => "Good professional background".to_string(),
        };
        let summary = match &skills {
            Some(list) => format!(
                "Resume analysis completed. Found {} years of experience with skills in {list}.",
                info.experience
            ),
            None => format!(
                "Resume analysis completed. Found {} years of experience.",
                info.experience
            ),
        };

        local_result(
            REVIEW_SCORE,
            vec![
                "Well-structured resume".to_string(),
                "Clear experience presentation".to_string(),
                skills_strength,
            ],
            strings(&[
                "Could add more quantifiable achievements",
                "Consider adding certifications",
                "Include metrics to demonstrate impact",
            ]),
            strings(&[
                "Highlight key achievements with metrics",
                "Include relevant certifications",
                "Add a professional summary section",
                "Quantify your accomplishments with numbers",
            ]),
            summary,
            info,
        )
    }

    fn grade_interview(&self, transcript: &str, candidate_name: &str) -> AnalysisResult {
        let mut info = extract_candidate_info(transcript);
        if !candidate_name.trim().is_empty() {
            info.name = candidate_name.trim().to_string();
        }

        let mut result = local_result(
            INTERVIEW_SCORE,
            strings(&["Completed the screening interview"]),
            strings(&["Detailed interview assessment requires AI"]),
            strings(&["Review the transcript manually before deciding"]),
            "Interview completed (AI parsing failed, using default).".to_string(),
            info,
        );
        result.status = Verdict::Consider;
        result
    }

    fn critique_response(&self, _question: &str, response: &str) -> AnalysisResult {
        // A single answer carries skills, not an identity.
        let mut info = extract_candidate_info(response);
        info.name = info::UNKNOWN_NAME.to_string();

        local_result(
            CRITIQUE_SCORE,
            strings(&["Clear communication"]),
            strings(&["Could add more specific examples"]),
            strings(&["Use the STAR method to structure answers"]),
            "Good response, consider adding more detail.".to_string(),
            info,
        )
    }

    fn interview_questions(&self, skills: &[String]) -> Vec<String> {
        let lead_skill = skills
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("programming");

        let mut questions = vec![format!("Tell me about your experience with {lead_skill}")];
        questions.extend(strings(&[
            "Describe a challenging project you worked on",
            "How do you approach problem-solving?",
            "What are your career goals?",
            "Why are you interested in this position?",
        ]));
        questions.truncate(QUESTIONS_PER_SET);
        questions
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared result assembly
// ────────────────────────────────────────────────────────────────────────────

fn local_result(
    score: u8,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    recommendations: Vec<String>,
    summary: String,
    extracted_info: CandidateInfo,
) -> AnalysisResult {
    AnalysisResult {
        score,
        strengths,
        weaknesses,
        recommendations,
        summary,
        extracted_info,
        gap_analysis: local_gap_analysis(),
        learning_path: vec![setup_step()],
        status: Verdict::from_score(score),
        mode: AnalysisMode::Local,
    }
}

pub fn local_gap_analysis() -> GapAnalysis {
    GapAnalysis {
        missing_skills: vec![LOCAL_MODE_MARKER.to_string()],
        experience_gaps: vec![EXPERIENCE_GAP_PLACEHOLDER.to_string()],
    }
}

/// Placeholder learning step pointing the operator at the missing model setup.
pub fn setup_step() -> LearningStep {
    LearningStep {
        title: "Complete AI Setup".to_string(),
        description: "To get personalized learning paths, please configure the Gemini API key \
                      in the backend."
            .to_string(),
        resources: vec!["Google AI Studio".to_string()],
        estimated_time: "5 minutes".to_string(),
    }
}

fn fit_recommendation(score: u8) -> &'static str {
    if score >= 80 {
        "Strong fit"
    } else if score >= 65 {
        "Potential fit"
    } else {
        "Consider for role"
    }
}

fn top_skills(info: &CandidateInfo) -> Option<String> {
    if info.skills.is_empty() {
        return None;
    }
    Some(
        info.skills
            .iter()
            .take(TOP_SKILLS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn non_empty_or(items: Vec<String>, fallback: &[&str]) -> Vec<String> {
    if items.is_empty() {
        strings(fallback)
    } else {
        items
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
