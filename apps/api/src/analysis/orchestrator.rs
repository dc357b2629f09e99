//! Analysis Orchestrator — the layered fallback chain every AI feature runs through.
//!
//! Tiers, in order:
//! 1. NoCredentials      → no model injected; answer locally (terminal)
//! 2. RemoteStructured   → JSON-mode call → extract → parse → required-field check
//! 3. RemoteTextFallback → free-text call → extract → parse → required-field check
//! 4. LocalFallback      → local analyzer, unparseable remote text spliced into the summary (terminal)
//!
//! `run` is total: every failure mode ends in tier 4, never in an error.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::heuristics::LocalAnalyzer;
use crate::llm_client::backoff::BackoffExecutor;
use crate::llm_client::extract::extract_text;
use crate::llm_client::{LanguageModel, LlmError, LlmRequest};
use crate::models::analysis::{AnalysisMode, AnalysisResult};
use crate::models::interview::{assemble_transcript, InterviewTurn};
use crate::parsing::{parse, ParsedStructure};

use super::normalize::{meets_required, normalize};
use super::prompts;

/// Characters of unparseable model output kept in a local result's summary.
pub const SPLICE_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    ResumeScoring {
        resume_text: String,
        job_description: Option<String>,
    },
    JobSeekerReview {
        resume_text: String,
    },
    InterviewGrading {
        job_title: String,
        candidate_name: String,
        turns: Vec<InterviewTurn>,
    },
    ResponseCritique {
        question: String,
        response: String,
        job_title: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    ResumeScoring,
    JobSeekerReview,
    InterviewGrading,
    ResponseCritique,
}

impl UseCase {
    /// Fields a remote payload must carry to be accepted (aliases apply).
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            UseCase::ResumeScoring => &["score", "strengths", "weaknesses"],
            UseCase::JobSeekerReview => &["score"],
            UseCase::InterviewGrading => &["score", "summary", "status"],
            UseCase::ResponseCritique => &["score"],
        }
    }

    /// Live critique is latency-sensitive and goes straight to free text.
    pub fn uses_structured_mode(&self) -> bool {
        !matches!(self, UseCase::ResponseCritique)
    }

    /// Whether the model's own `status` verdict is kept.
    pub fn reports_verdict(&self) -> bool {
        matches!(self, UseCase::InterviewGrading)
    }

    pub fn label(&self) -> &'static str {
        match self {
            UseCase::ResumeScoring => "resume_scoring",
            UseCase::JobSeekerReview => "job_seeker_review",
            UseCase::InterviewGrading => "interview_grading",
            UseCase::ResponseCritique => "response_critique",
        }
    }
}

impl AnalysisRequest {
    pub fn use_case(&self) -> UseCase {
        match self {
            AnalysisRequest::ResumeScoring { .. } => UseCase::ResumeScoring,
            AnalysisRequest::JobSeekerReview { .. } => UseCase::JobSeekerReview,
            AnalysisRequest::InterviewGrading { .. } => UseCase::InterviewGrading,
            AnalysisRequest::ResponseCritique { .. } => UseCase::ResponseCritique,
        }
    }

    fn prompt(&self) -> String {
        match self {
            AnalysisRequest::ResumeScoring {
                resume_text,
                job_description,
            } => prompts::resume_scoring(resume_text, job_description.as_deref()),
            AnalysisRequest::JobSeekerReview { resume_text } => {
                prompts::job_seeker_review(resume_text)
            }
            AnalysisRequest::InterviewGrading {
                job_title,
                candidate_name,
                turns,
            } => prompts::interview_grading(job_title, candidate_name, &assemble_transcript(turns)),
            AnalysisRequest::ResponseCritique {
                question,
                response,
                job_title,
            } => prompts::response_critique(question, response, job_title),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// What one remote tier produced.
enum TierOutcome {
    Accepted(Value),
    /// The call succeeded but the text did not yield a valid payload.
    Unusable(String),
    Failed(LlmError),
}

/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    model: Option<Arc<dyn LanguageModel>>,
    executor: BackoffExecutor,
    local: Arc<dyn LocalAnalyzer>,
}

impl AnalysisOrchestrator {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        executor: BackoffExecutor,
        local: Arc<dyn LocalAnalyzer>,
    ) -> Self {
        Self {
            model,
            executor,
            local,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub(crate) fn local(&self) -> &dyn LocalAnalyzer {
        self.local.as_ref()
    }

    pub async fn run(&self, request: &AnalysisRequest) -> AnalysisResult {
        self.run_with_cancel(request, &CancellationToken::new()).await
    }

    /// Runs the fallback chain. A cancelled token stops remote work and
    /// yields the local result.
    pub async fn run_with_cancel(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let use_case = request.use_case();
        let label = use_case.label();

        let Some(model) = self.model.as_deref() else {
            info!("{label}: no model configured, using local analysis");
            return self.local_fallback(request, None);
        };

        let prompt = request.prompt();
        let mut unusable_text: Option<String> = None;

        if use_case.uses_structured_mode() {
            let llm_request = LlmRequest::structured(prompt.clone());
            match self.attempt(model, &llm_request, use_case, cancel).await {
                TierOutcome::Accepted(value) => {
                    info!("{label}: structured analysis accepted");
                    return self.finish(request, &value, AnalysisMode::RemoteStructured);
                }
                TierOutcome::Unusable(text) => {
                    debug!("{label}: structured output unusable, trying free text");
                    unusable_text = Some(text);
                }
                TierOutcome::Failed(LlmError::Cancelled) => {
                    info!("{label}: cancelled, using local analysis");
                    return self.local_fallback(request, None);
                }
                TierOutcome::Failed(e) => {
                    warn!("{label}: structured call failed ({e}), trying free text");
                }
            }
        }

        let llm_request = LlmRequest::text(prompt);
        match self.attempt(model, &llm_request, use_case, cancel).await {
            TierOutcome::Accepted(value) => {
                info!("{label}: free-text analysis accepted");
                return self.finish(request, &value, AnalysisMode::RemoteText);
            }
            TierOutcome::Unusable(text) => {
                debug!("{label}: free-text output unusable ({} chars)", text.len());
                unusable_text = Some(text);
            }
            TierOutcome::Failed(LlmError::Cancelled) => {
                info!("{label}: cancelled, using local analysis");
                return self.local_fallback(request, None);
            }
            TierOutcome::Failed(e) => {
                warn!("{label}: free-text call failed ({e})");
            }
        }

        info!("{label}: remote tiers exhausted, using local analysis");
        self.local_fallback(request, unusable_text.as_deref())
    }

    /// The terminal tier. `unparsed` is remote text that could not be used;
    /// when present its head replaces the summary.
    pub fn local_fallback(&self, request: &AnalysisRequest, unparsed: Option<&str>) -> AnalysisResult {
        let mut result = match request {
            AnalysisRequest::ResumeScoring {
                resume_text,
                job_description,
            } => self.local.analyze(resume_text, job_description.as_deref()),
            AnalysisRequest::JobSeekerReview { resume_text } => self.local.review(resume_text),
            AnalysisRequest::InterviewGrading {
                candidate_name,
                turns,
                ..
            } => self
                .local
                .grade_interview(&assemble_transcript(turns), candidate_name),
            AnalysisRequest::ResponseCritique {
                question, response, ..
            } => self.local.critique_response(question, response),
        };

        if let Some(spliced) = unparsed.and_then(splice) {
            result.summary = spliced;
        }
        result
    }

    /// One free-text generation through the backoff executor. `None` when no
    /// model is configured, the call fails, or the text is blank.
    pub async fn generate_text(&self, prompt: &str, cancel: &CancellationToken) -> Option<String> {
        let model = self.model.as_deref()?;
        let request = LlmRequest::text(prompt);

        match self
            .executor
            .execute("generate_text", cancel, || model.generate(&request))
            .await
        {
            Ok(response) => {
                let text = extract_text(&response);
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                warn!("generate_text failed: {e}");
                None
            }
        }
    }

    async fn attempt(
        &self,
        model: &dyn LanguageModel,
        request: &LlmRequest,
        use_case: UseCase,
        cancel: &CancellationToken,
    ) -> TierOutcome {
        let response = match self
            .executor
            .execute(use_case.label(), cancel, || model.generate(request))
            .await
        {
            Ok(response) => response,
            Err(e) => return TierOutcome::Failed(e),
        };

        let text = extract_text(&response);
        match parse(&text) {
            ParsedStructure::Parsed(value) if meets_required(&value, use_case.required_fields()) => {
                TierOutcome::Accepted(value)
            }
            ParsedStructure::Parsed(_) => {
                debug!(
                    "{}: payload missing required fields {:?}",
                    use_case.label(),
                    use_case.required_fields()
                );
                TierOutcome::Unusable(text)
            }
            ParsedStructure::Absent => TierOutcome::Unusable(text),
        }
    }

    fn finish(&self, request: &AnalysisRequest, value: &Value, mode: AnalysisMode) -> AnalysisResult {
        let use_case = request.use_case();
        let baseline = self.local_fallback(request, None);
        normalize(value, baseline, mode, use_case.reports_verdict())
    }
}

/// First `SPLICE_CHARS` characters of `raw`, with `...` when truncated.
fn splice(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.chars().count() <= SPLICE_CHARS {
        return Some(raw.to_string());
    }
    let head: String = raw.chars().take(SPLICE_CHARS).collect();
    Some(format!("{head}..."))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
