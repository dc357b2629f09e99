//! Axum route handlers for the Analysis and Interview APIs.
//!
//! Only input validation can fail here; analysis itself is total.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::batch::{BatchItem, BatchOutcome};
use crate::analysis::interview::InterviewContext;
use crate::analysis::orchestrator::AnalysisRequest;
use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::interview::{ConversationReply, InterviewStep, InterviewTurn};
use crate::state::AppState;

/// Upper bound on resumes per screening batch.
pub const MAX_BATCH_ITEMS: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisRequest {
    pub resume_text: String,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub job_description: Option<String>,
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchOutcome>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsRequest {
    pub job_title: String,
    #[serde(default)]
    pub candidate_skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub history: Vec<InterviewTurn>,
    pub candidate_name: String,
    pub job_title: String,
    #[serde(default)]
    pub question_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub history: Vec<InterviewTurn>,
    pub candidate_name: String,
    pub job_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CritiqueRequest {
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub job_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    pub message: String,
    #[serde(default, alias = "conversationHistory")]
    pub history: Vec<InterviewTurn>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub resume_analysis: Option<Value>,
    #[serde(default)]
    pub candidate_skills: Vec<String>,
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis/resume
///
/// Scores a resume, against a job description when one is given.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Json(request): Json<ResumeAnalysisRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    require(&request.resume_text, "resumeText")?;

    let result = state
        .orchestrator
        .run(&AnalysisRequest::ResumeScoring {
            resume_text: request.resume_text,
            job_description: request.job_description,
        })
        .await;

    Ok(Json(result))
}

/// POST /api/v1/analysis/review
pub async fn handle_review_resume(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    require(&request.resume_text, "resumeText")?;

    let result = state
        .orchestrator
        .run(&AnalysisRequest::JobSeekerReview {
            resume_text: request.resume_text,
        })
        .await;

    Ok(Json(result))
}

/// POST /api/v1/analysis/batch
///
/// Screens up to `MAX_BATCH_ITEMS` resumes concurrently. Results follow input order.
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    if request.items.is_empty() {
        return Err(AppError::Validation("items cannot be empty".to_string()));
    }
    if request.items.len() > MAX_BATCH_ITEMS {
        return Err(AppError::Validation(format!(
            "at most {MAX_BATCH_ITEMS} items per batch"
        )));
    }
    for (index, item) in request.items.iter().enumerate() {
        require(&item.resume_text, &format!("items[{index}].resumeText"))?;
    }

    let results = state
        .batch
        .screen(request.items, request.job_description)
        .await;

    Ok(Json(BatchResponse { results }))
}

/// POST /api/v1/interview/questions
pub async fn handle_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    require(&request.job_title, "jobTitle")?;

    let questions = state
        .orchestrator
        .generate_questions(&request.job_title, &request.candidate_skills)
        .await;

    Ok(Json(QuestionsResponse { questions }))
}

/// POST /api/v1/interview/process
///
/// Returns the next question, or the closing and grade once the screen is over.
pub async fn handle_process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<InterviewStep>, AppError> {
    require(&request.job_title, "jobTitle")?;

    let step = state
        .orchestrator
        .next_step(
            &request.history,
            request.question_count,
            &request.job_title,
            &request.candidate_name,
        )
        .await;

    Ok(Json(step))
}

/// POST /api/v1/interview/finalize
pub async fn handle_finalize(
    State(state): State<AppState>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    if request.history.is_empty() {
        return Err(AppError::Validation("history cannot be empty".to_string()));
    }

    let result = state
        .orchestrator
        .run(&AnalysisRequest::InterviewGrading {
            job_title: request.job_title,
            candidate_name: request.candidate_name,
            turns: request.history,
        })
        .await;

    Ok(Json(result))
}

/// POST /api/v1/interview/critique
///
/// Live feedback on a single answer.
pub async fn handle_critique(
    State(state): State<AppState>,
    Json(request): Json<CritiqueRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    require(&request.question, "question")?;
    require(&request.response, "response")?;

    let result = state
        .orchestrator
        .run(&AnalysisRequest::ResponseCritique {
            question: request.question,
            response: request.response,
            job_title: request.job_title.unwrap_or_default(),
        })
        .await;

    Ok(Json(result))
}

/// POST /api/v1/interview/conversation
///
/// One chat-interview turn: the interviewer's reply plus live feedback on the answer.
pub async fn handle_conversation(
    State(state): State<AppState>,
    Json(request): Json<ConversationRequest>,
) -> Result<Json<ConversationReply>, AppError> {
    require(&request.message, "message")?;

    let context = InterviewContext {
        job_title: request.job_title.unwrap_or_default(),
        job_description: request.job_description.unwrap_or_default(),
        resume_analysis: request.resume_analysis,
        skills: request.candidate_skills,
    };

    let reply = state
        .orchestrator
        .converse(&request.message, &request.history, &context)
        .await;

    Ok(Json(reply))
}
