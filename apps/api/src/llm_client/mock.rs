//! Scripted in-memory `LanguageModel` for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{LanguageModel, LlmError, LlmRequest};

/// What the mock answers for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Wrapped in a Gemini `candidates[0].content.parts[0].text` envelope.
    Text(String),
    /// Returned verbatim as the response body.
    Body(Value),
    Fail { status: u16, message: String },
    Timeout,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn fail(status: u16, message: &str) -> Self {
        Reply::Fail {
            status,
            message: message.to_string(),
        }
    }

    fn into_outcome(self) -> Result<Value, LlmError> {
        match self {
            Reply::Text(text) => Ok(json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            })),
            Reply::Body(body) => Ok(body),
            Reply::Fail { status, message } => Err(LlmError::Api { status, message }),
            Reply::Timeout => Err(LlmError::Timeout),
        }
    }
}

type Responder = Box<dyn Fn(&LlmRequest, usize) -> (Duration, Reply) + Send + Sync>;

pub struct ScriptedModel {
    responder: Responder,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedModel {
    /// Answers every call with a function of the request and the 0-based call index.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&LlmRequest, usize) -> (Duration, Reply) + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self::new(move |_, _| (Duration::ZERO, reply.clone()))
    }

    /// Replies in order; once exhausted, repeats the last reply.
    pub fn sequence(replies: Vec<Reply>) -> Self {
        Self::new(move |_, index| {
            let reply = replies
                .get(index)
                .or_else(|| replies.last())
                .cloned()
                .unwrap_or(Reply::Timeout);
            (Duration::ZERO, reply)
        })
    }

    /// Structured-mode calls get `structured`, free-text calls get `text`.
    pub fn by_mode(structured: Reply, text: Reply) -> Self {
        Self::new(move |request, _| {
            let reply = if request.structured_output_requested {
                structured.clone()
            } else {
                text.clone()
            };
            (Duration::ZERO, reply)
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: &LlmRequest) -> Result<Value, LlmError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let (delay, reply) = (self.responder)(request, index);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.into_outcome()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
