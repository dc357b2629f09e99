use serde::{Deserialize, Serialize};

use crate::models::analysis::AnalysisResult;

/// Who spoke a turn. Accepts the role names the chat front-ends send; any
/// role that is not an interviewer name counts as the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Speaker {
    Interviewer,
    Candidate,
}

impl From<String> for Speaker {
    fn from(role: String) -> Self {
        match role.trim().to_lowercase().as_str() {
            "interviewer" | "ai" | "assistant" | "recruiter" | "model" => Speaker::Interviewer,
            _ => Speaker::Candidate,
        }
    }
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Interviewer => "Interviewer",
            Speaker::Candidate => "Candidate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewTurn {
    pub role: Speaker,
    #[serde(alias = "content")]
    pub text: String,
}

#[cfg(test)]
impl InterviewTurn {
    pub fn new(role: Speaker, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Renders turns as `Interviewer: ...` / `Candidate: ...` lines.
pub fn assemble_transcript(turns: &[InterviewTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), t.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of advancing a screening interview by one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterviewStep {
    Question {
        text: String,
    },
    Complete {
        closing: String,
        grade: AnalysisResult,
    },
}

/// Interviewer reply for one chat-interview turn. `analysis` is live feedback
/// on the candidate's message, present when it answered an earlier question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationReply {
    pub reply: String,
    pub analysis: Option<AnalysisResult>,
}
