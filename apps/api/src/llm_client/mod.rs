/// LLM Client — the single point of entry for all remote model calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Callers hold an injected `Arc<dyn LanguageModel>`; retries live in
/// `backoff`, response normalization in `extract`.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

pub mod backoff;
pub mod extract;
pub mod prompts;

#[cfg(test)]
pub mod mock;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Default model alias. Overridable through `GEMINI_MODEL`.
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Service error: {0}")]
    Service(String),

    #[error("Request timed out")]
    Timeout,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Call cancelled by caller")]
    Cancelled,
}

impl LlmError {
    /// HTTP-style status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            LlmError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Free-text message used by the retry classifier.
    pub fn message(&self) -> String {
        match self {
            LlmError::Api { message, .. } => message.clone(),
            LlmError::Service(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// One remote invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmRequest {
    pub prompt: String,
    /// Ask the service to constrain output to JSON.
    pub structured_output_requested: bool,
}

impl LlmRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            structured_output_requested: false,
        }
    }

    pub fn structured(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            structured_output_requested: true,
        }
    }
}

/// The remote model seam. Implemented by `GeminiClient` in production and by
/// scripted mocks in tests.
///
/// Returns the raw response body; its shape is not stable across response
/// variants, so callers go through `extract::extract_text`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &LlmRequest) -> Result<Value, LlmError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini `generateContent` client. Performs exactly one HTTP attempt per
/// call; retry policy is the caller's concern.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:generateContent", self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: &LlmRequest) -> Result<Value, LlmError> {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        });
        if request.structured_output_requested {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Keep the service status name (e.g. UNAVAILABLE) in the message so the
            // classifier can see it.
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| match e.error.status {
                    Some(s) => format!("{s}: {}", e.error.message),
                    None => e.error.message,
                })
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response.json().await?;
        if let Some(reason) = blocked_reason(&value) {
            return Err(LlmError::Service(format!("Prompt blocked: {reason}")));
        }
        debug!(
            "Gemini call succeeded (model={}, structured={})",
            self.model, request.structured_output_requested
        );
        Ok(value)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// A 200 response with no candidates and a `promptFeedback.blockReason`
/// means the prompt was refused.
fn blocked_reason(body: &Value) -> Option<String> {
    let has_candidates = body
        .get("candidates")
        .and_then(Value::as_array)
        .is_some_and(|c| !c.is_empty());
    if has_candidates {
        return None;
    }
    body.pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_prompt_detected_only_without_candidates() {
        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(blocked_reason(&blocked).as_deref(), Some("SAFETY"));

        let answered = json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }],
            "promptFeedback": { "blockReason": "SAFETY" }
        });
        assert_eq!(blocked_reason(&answered), None);
        assert_eq!(blocked_reason(&json!({})), None);
    }

    #[test]
    fn test_request_constructors_set_mode() {
        assert!(LlmRequest::structured("p").structured_output_requested);
        assert!(!LlmRequest::text("p").structured_output_requested);
    }

    #[test]
    fn test_api_error_exposes_status_and_message() {
        let err = LlmError::Api {
            status: 503,
            message: "UNAVAILABLE: overloaded".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert!(err.message().contains("overloaded"));
    }

    #[test]
    fn test_service_error_has_no_status() {
        let err = LlmError::Service("rate limit exceeded".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.message(), "rate limit exceeded");
    }

    #[test]
    fn test_endpoint_includes_model() {
        let client =
            GeminiClient::new("key".to_string(), DEFAULT_MODEL.to_string(), 5).unwrap();
        assert!(client.endpoint().ends_with("gemini-flash-latest:generateContent"));
        assert_eq!(client.model_name(), DEFAULT_MODEL);
    }
}
