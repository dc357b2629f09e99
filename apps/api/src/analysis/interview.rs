//! Interview flows built on the orchestrator: question sets, the voice
//! screen (next spoken question, then closing + grade once enough were
//! asked), and the chat-style mock interview with live answer feedback.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::interview::{
    assemble_transcript, ConversationReply, InterviewStep, InterviewTurn, Speaker,
};
use crate::parsing::parse;

use super::normalize::{resume_highlights, root_object};
use super::orchestrator::{AnalysisOrchestrator, AnalysisRequest};
use super::prompts::{self, InterviewerTurn};

/// Questions asked before the screen is finalized and graded.
pub const QUESTIONS_PER_SCREEN: u32 = 3;
pub const QUESTIONS_PER_SET: usize = 5;

pub const NEXT_QUESTION_FALLBACK: &str =
    "Could you tell me a bit about your background and experience relevant to this role?";
pub const CLOSING_FALLBACK: &str =
    "Thank you for your time. We will review your responses and get back to you shortly.";

pub const CONVERSATION_FALLBACK: &str =
    "Thank you for your response. Can you tell me more about that?";

/// Most recent turns quoted back to the model in a chat interview.
const CONVERSATION_WINDOW: usize = 10;

const SPEAKER_PREFIXES: &[&str] = &["interviewer:", "recruiter:", "ai:"];

/// What the chat interviewer knows about the role and the candidate.
#[derive(Debug, Clone, Default)]
pub struct InterviewContext {
    pub job_title: String,
    pub job_description: String,
    /// An earlier resume analysis, in our shape or an older client's.
    pub resume_analysis: Option<Value>,
    pub skills: Vec<String>,
}

impl AnalysisOrchestrator {
    pub async fn generate_questions(&self, job_title: &str, skills: &[String]) -> Vec<String> {
        self.generate_questions_with_cancel(job_title, skills, &CancellationToken::new())
            .await
    }

    /// Always returns `QUESTIONS_PER_SET` questions; model output is topped up
    /// from the local set when short.
    pub async fn generate_questions_with_cancel(
        &self,
        job_title: &str,
        skills: &[String],
        cancel: &CancellationToken,
    ) -> Vec<String> {
        let fallback = self.local().interview_questions(skills);

        let generated = match self
            .generate_text(&prompts::interview_questions(job_title, skills), cancel)
            .await
        {
            Some(text) => question_list(&text),
            None => Vec::new(),
        };

        if generated.is_empty() {
            info!("interview_questions: using local question set");
            return fallback;
        }

        let mut questions: Vec<String> = Vec::with_capacity(QUESTIONS_PER_SET);
        for question in generated.into_iter().chain(fallback) {
            if questions.len() >= QUESTIONS_PER_SET {
                break;
            }
            if !questions.contains(&question) {
                questions.push(question);
            }
        }
        questions
    }

    pub async fn next_step(
        &self,
        turns: &[InterviewTurn],
        question_count: u32,
        job_title: &str,
        candidate_name: &str,
    ) -> InterviewStep {
        self.next_step_with_cancel(
            turns,
            question_count,
            job_title,
            candidate_name,
            &CancellationToken::new(),
        )
        .await
    }

    /// Below `QUESTIONS_PER_SCREEN` asks another question; at or above it
    /// closes the call and grades the transcript.
    pub async fn next_step_with_cancel(
        &self,
        turns: &[InterviewTurn],
        question_count: u32,
        job_title: &str,
        candidate_name: &str,
        cancel: &CancellationToken,
    ) -> InterviewStep {
        let transcript = assemble_transcript(turns);

        if question_count < QUESTIONS_PER_SCREEN {
            let prompt = prompts::next_question(job_title, candidate_name, &transcript, question_count);
            let text = self
                .generate_text(&prompt, cancel)
                .await
                .map(|q| strip_speaker_prefix(&q))
                .filter(|q| !q.is_empty())
                .unwrap_or_else(|| NEXT_QUESTION_FALLBACK.to_string());
            return InterviewStep::Question { text };
        }

        debug!("interview: {question_count} questions asked, finalizing");
        let grading = AnalysisRequest::InterviewGrading {
            job_title: job_title.to_string(),
            candidate_name: candidate_name.to_string(),
            turns: turns.to_vec(),
        };
        let closing_prompt = prompts::closing_summary(job_title, candidate_name, &transcript);

        let (closing, grade) = tokio::join!(
            self.generate_text(&closing_prompt, cancel),
            self.run_with_cancel(&grading, cancel),
        );

        InterviewStep::Complete {
            closing: closing.unwrap_or_else(|| CLOSING_FALLBACK.to_string()),
            grade,
        }
    }
}

impl AnalysisOrchestrator {
    pub async fn converse(
        &self,
        message: &str,
        history: &[InterviewTurn],
        context: &InterviewContext,
    ) -> ConversationReply {
        self.converse_with_cancel(message, history, context, &CancellationToken::new())
            .await
    }

    /// One chat-interview turn: the interviewer's next line, plus a critique of
    /// `message` against the last interviewer question when there is one. The
    /// reply and the critique run concurrently.
    pub async fn converse_with_cancel(
        &self,
        message: &str,
        history: &[InterviewTurn],
        context: &InterviewContext,
        cancel: &CancellationToken,
    ) -> ConversationReply {
        let recent = &history[history.len().saturating_sub(CONVERSATION_WINDOW)..];
        let highlights = context.resume_analysis.as_ref().and_then(resume_highlights);

        let prompt = prompts::interviewer_reply(&InterviewerTurn {
            job_title: &context.job_title,
            job_description: &context.job_description,
            resume: highlights.as_ref(),
            skills: &context.skills,
            history: &assemble_transcript(recent),
            message,
        });

        let critique = last_question(history).map(|question| AnalysisRequest::ResponseCritique {
            question: question.to_string(),
            response: message.to_string(),
            job_title: context.job_title.clone(),
        });

        let (reply, analysis) = tokio::join!(self.generate_text(&prompt, cancel), async {
            match &critique {
                Some(request) => Some(self.run_with_cancel(request, cancel).await),
                None => None,
            }
        });

        if analysis.is_none() {
            debug!("conversation: no earlier question, skipping live critique");
        }

        ConversationReply {
            reply: reply.unwrap_or_else(|| CONVERSATION_FALLBACK.to_string()),
            analysis,
        }
    }
}

/// Text of the latest non-blank interviewer turn.
fn last_question(history: &[InterviewTurn]) -> Option<&str> {
    history
        .iter()
        .rev()
        .filter(|turn| turn.role == Speaker::Interviewer)
        .map(|turn| turn.text.trim())
        .find(|text| !text.is_empty())
}

/// Non-blank question strings from a JSON array or a `{"questions": [...]}` object.
fn question_list(text: &str) -> Vec<String> {
    let Some(value) = parse(text).into_value() else {
        return Vec::new();
    };

    let items = match &value {
        Value::Array(items) => items.as_slice(),
        other => match root_object(other).and_then(|o| o.get("questions")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from)
        .collect()
}

fn strip_speaker_prefix(text: &str) -> String {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    SPEAKER_PREFIXES
        .iter()
        .find(|p| lower.starts_with(*p))
        .and_then(|p| trimmed.get(p.len()..))
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
