// Analysis prompt templates — one builder per use case.
// Every structured prompt ends with the shared JSON-only instruction.

use crate::llm_client::prompts::with_json_instruction;

use super::normalize::ResumeHighlights;

const RESULT_SCHEMA: &str = r#"{
  "score": number,
  "strengths": string[],
  "weaknesses": string[],
  "recommendations": string[],
  "aiSummary": string,
  "extractedInfo": {
    "name": string,
    "email": string,
    "phone": string,
    "experience": number,
    "skills": string[],
    "education": string,
    "location": string
  },
  "gapAnalysis": { "missingSkills": string[], "experienceGaps": string[] },
  "learningPath": [{ "title": string, "description": string, "resources": string[], "estimatedTime": string }]
}"#;

pub fn resume_scoring(resume_text: &str, job_description: Option<&str>) -> String {
    let job = match job_description.map(str::trim).filter(|jd| !jd.is_empty()) {
        Some(jd) => format!("Job Description:\n{jd}"),
        None => "No job description was provided; assess general employability.".to_string(),
    };

    with_json_instruction(&format!(
        "You are an expert recruiter. Analyze this resume against the job description.\n\n\
         Resume:\n{resume_text}\n\n{job}\n\n\
         Provide a match score (0-100), the top 3 strengths, the top 3 areas for improvement, \
         an overall recommendation, the extracted candidate information, a gap analysis and \
         a learning path of 3-5 steps with resources.\n\n\
         JSON must strictly conform to this schema:\n{RESULT_SCHEMA}"
    ))
}

pub fn job_seeker_review(resume_text: &str) -> String {
    with_json_instruction(&format!(
        "You are a career coach reviewing a job seeker's resume. There is no target job; \
         judge overall quality, clarity and impact.\n\n\
         Resume:\n{resume_text}\n\n\
         Return an overallScore (0-100), strengths, weaknesses, concrete recommendations, \
         a summary, the extracted candidate information, a gap analysis and a learning path.\n\n\
         JSON must strictly conform to this schema (with \"overallScore\" in place of \
         \"score\" and \"summary\" in place of \"aiSummary\"):\n{RESULT_SCHEMA}"
    ))
}

pub fn interview_grading(job_title: &str, candidate_name: &str, transcript: &str) -> String {
    with_json_instruction(&format!(
        "You are an expert hiring manager. Grade this interview of {candidate_name} for the \
         role of \"{job_title}\".\n\n\
         TRANSCRIPT:\n{transcript}\n\n\
         Assess communication skills, technical relevance and professionalism. Assign a \
         score 0-100 and write a short summary.\n\n\
         RETURN JSON:\n\
         {{\n  \"score\": number,\n  \"summary\": string,\n  \
         \"status\": \"Recommended\" | \"Consider\" | \"Rejected\",\n  \
         \"strengths\": string[],\n  \"improvements\": string[]\n}}"
    ))
}

pub fn response_critique(question: &str, response: &str, job_title: &str) -> String {
    let job = if job_title.trim().is_empty() {
        "General"
    } else {
        job_title.trim()
    };

    with_json_instruction(&format!(
        "Quick analysis (be concise):\nQuestion: {question}\nResponse: {response}\nJob: {job}\n\n\
         JSON only:\n\
         {{\n  \"score\": number,\n  \"strengths\": string[],\n  \
         \"improvements\": string[],\n  \"assessment\": string\n}}"
    ))
}

pub fn interview_questions(job_title: &str, skills: &[String]) -> String {
    with_json_instruction(&format!(
        "Generate 5 relevant interview questions for a {job_title} position.\n\
         The candidate has these skills: {}\n\n\
         Include technical questions, behavioral questions and problem-solving scenarios.\n\n\
         Return a JSON array of 5 strings.",
        skills.join(", ")
    ))
}

pub fn next_question(
    job_title: &str,
    candidate_name: &str,
    transcript: &str,
    question_count: u32,
) -> String {
    format!(
        "You are an expert technical recruiter conducting a phone screen for a {job_title} \
         position. The candidate's name is {candidate_name}.\n\n\
         Transcript so far:\n{transcript}\n\n\
         You have asked {question_count} questions so far. Generate the NEXT question to ask.\n\
         - Do NOT repeat a question that has already been asked.\n\
         - If the transcript is empty, ask about their background.\n\
         - Otherwise acknowledge the last answer briefly and ask a relevant follow-up or \
         move to a new topic.\n\
         - Keep it conversational and under 2 sentences.\n\
         - Do NOT include \"Candidate:\" or \"Interviewer:\" prefixes. Just the spoken text."
    )
}

pub fn closing_summary(job_title: &str, candidate_name: &str, transcript: &str) -> String {
    format!(
        "You are an expert technical recruiter closing a phone screen for a {job_title} \
         position. The candidate's name is {candidate_name}.\n\n\
         Transcript:\n{transcript}\n\n\
         Give a brief, professional summary of the candidate's responses and their potential \
         fit, addressed to the candidate directly as if closing the call. Under 100 words."
    )
}

/// Context for one interviewer turn of the chat-style mock interview.
pub struct InterviewerTurn<'a> {
    pub job_title: &'a str,
    pub job_description: &'a str,
    pub resume: Option<&'a ResumeHighlights>,
    pub skills: &'a [String],
    pub history: &'a str,
    pub message: &'a str,
}

pub fn interviewer_reply(turn: &InterviewerTurn<'_>) -> String {
    let or_unspecified = |items: &[String]| {
        if items.is_empty() {
            "Not specified".to_string()
        } else {
            items.join(", ")
        }
    };
    let job_title = non_blank(turn.job_title).unwrap_or("position");
    let job_description = non_blank(turn.job_description).unwrap_or("Not provided");

    let resume = turn
        .resume
        .map(|r| {
            format!(
                "RESUME ANALYSIS SUMMARY:\n\
                 - Candidate Experience: {} years\n\
                 - Key Skills: {}\n\
                 - Match Score: {}/100\n\
                 - Strengths: {}\n\
                 - Areas to Explore: {}\n\
                 - Summary: {}\n\n",
                r.experience,
                or_unspecified(&r.skills),
                r.score,
                or_unspecified(&r.strengths),
                or_unspecified(&r.weaknesses),
                r.summary.as_deref().unwrap_or("No summary available"),
            )
        })
        .unwrap_or_default();

    let skills = if turn.skills.is_empty() {
        String::new()
    } else {
        format!("CANDIDATE SKILLS: {}\n\n", turn.skills.join(", "))
    };

    let history = match non_blank(turn.history) {
        Some(h) => format!("PREVIOUS CONVERSATION:\n{h}\n\n"),
        None => String::new(),
    };

    format!(
        "You are a professional, experienced interviewer conducting a formal job interview \
         for a {job_title}.\n\n\
         JOB DESCRIPTION:\n{job_description}\n\n\
         {resume}{skills}\
         YOUR ROLE AS INTERVIEWER:\n\
         - Ask targeted questions based on the job description and the candidate's resume\n\
         - Explore gaps or areas mentioned in the resume analysis\n\
         - Mix behavioral questions (STAR method) with technical questions for the position\n\
         - After the candidate responds, ask a follow-up or move to the next topic\n\
         - Do NOT provide feedback or scores during the interview\n\n\
         {history}\
         CANDIDATE'S RESPONSE: {}\n\n\
         Respond as the interviewer with your next question or follow-up. Keep it to 1-2 \
         sentences, or 2-3 if you give context before the question.",
        turn.message.trim()
    )
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_scoring_includes_jd_or_notice() {
        let prompt = resume_scoring("resume body", Some("Rust engineer"));
        assert!(prompt.contains("Job Description:\nRust engineer"));
        assert!(prompt.contains("\"learningPath\""));

        let prompt = resume_scoring("resume body", Some("  "));
        assert!(prompt.contains("No job description was provided"));
    }

    #[test]
    fn test_structured_prompts_end_with_json_instruction() {
        let skills = vec!["rust".to_string()];
        for prompt in [
            resume_scoring("r", None),
            job_seeker_review("r"),
            interview_grading("SRE", "Kim", "Interviewer: hi"),
            response_critique("q", "a", ""),
            interview_questions("SRE", &skills),
        ] {
            assert!(prompt.ends_with("trailing commas."), "{prompt}");
        }
    }

    #[test]
    fn test_critique_defaults_job_to_general() {
        assert!(response_critique("q", "a", " ").contains("Job: General"));
    }

    #[test]
    fn test_interviewer_reply_includes_context() {
        let resume = ResumeHighlights {
            experience: 6,
            skills: vec!["Go".to_string()],
            score: 82,
            strengths: vec![],
            weaknesses: vec!["Testing".to_string()],
            summary: None,
        };
        let skills = vec!["Kafka".to_string()];
        let prompt = interviewer_reply(&InterviewerTurn {
            job_title: "Backend Engineer",
            job_description: "Build payment APIs",
            resume: Some(&resume),
            skills: &skills,
            history: "Interviewer: Hi\nCandidate: Hello",
            message: " I led the ledger rewrite. ",
        });

        assert!(prompt.contains("interview for a Backend Engineer."));
        assert!(prompt.contains("JOB DESCRIPTION:\nBuild payment APIs"));
        assert!(prompt.contains("- Candidate Experience: 6 years"));
        assert!(prompt.contains("- Match Score: 82/100"));
        assert!(prompt.contains("- Strengths: Not specified"));
        assert!(prompt.contains("- Summary: No summary available"));
        assert!(prompt.contains("CANDIDATE SKILLS: Kafka"));
        assert!(prompt.contains("PREVIOUS CONVERSATION:\nInterviewer: Hi"));
        assert!(prompt.contains("CANDIDATE'S RESPONSE: I led the ledger rewrite."));
    }

    #[test]
    fn test_interviewer_reply_without_context() {
        let prompt = interviewer_reply(&InterviewerTurn {
            job_title: " ",
            job_description: "",
            resume: None,
            skills: &[],
            history: "",
            message: "Hello",
        });
        assert!(prompt.contains("interview for a position."));
        assert!(prompt.contains("JOB DESCRIPTION:\nNot provided"));
        assert!(!prompt.contains("RESUME ANALYSIS SUMMARY"));
        assert!(!prompt.contains("CANDIDATE SKILLS"));
        assert!(!prompt.contains("PREVIOUS CONVERSATION"));
    }

    #[test]
    fn test_next_question_mentions_count() {
        let prompt = next_question("SRE", "Kim", "", 2);
        assert!(prompt.contains("asked 2 questions"));
    }
}
