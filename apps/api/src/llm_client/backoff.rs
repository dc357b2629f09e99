//! Backoff Executor — generic retry wrapper around any remote model call.
//!
//! Retryability is decided in exactly one place, `classify_retryable`. The
//! remote service has no stable machine-readable error taxonomy, so the
//! message substring checks live here and nowhere else.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::LlmError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

const TRANSIENT_STATUSES: &[u16] = &[429, 500, 502, 503];
const TRANSIENT_MESSAGE_MARKERS: &[&str] = &["overloaded", "rate limit", "unavailable"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Transient,
    Fatal,
}

/// Classifies a remote failure. Transient when the status is 429/500/502/503
/// or the message mentions overload, rate limiting or unavailability.
pub fn classify_retryable(error: &LlmError) -> RetryClass {
    if let Some(status) = error.status() {
        if TRANSIENT_STATUSES.contains(&status) {
            return RetryClass::Transient;
        }
    }

    let message = error.message().to_lowercase();
    if TRANSIENT_MESSAGE_MARKERS.iter().any(|m| message.contains(m)) {
        return RetryClass::Transient;
    }

    RetryClass::Fatal
}

/// Per-invocation retry bookkeeping. Dropped when the call resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl RetryState {
    fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            attempt: 0,
            max_retries,
            base_delay_ms,
        }
    }

    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_retries
    }

    /// `base_delay_ms * 2^attempt`, no jitter.
    pub fn delay(&self) -> Duration {
        let factor = 1u64.checked_shl(self.attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Runs an async operation up to `max_retries + 1` times with exponential
/// backoff between transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffExecutor {
    max_retries: u32,
    base_delay_ms: u64,
}

impl Default for BackoffExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY_MS)
    }
}

impl BackoffExecutor {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Executes `op`, retrying transient failures.
    ///
    /// Fatal errors are returned on first occurrence. After the last attempt
    /// the last error is returned. The backoff wait and the call itself both
    /// race `cancel`; a cancelled token ends the sequence with
    /// `LlmError::Cancelled`.
    pub async fn execute<T, F, Fut>(
        &self,
        context: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut state = RetryState::new(self.max_retries, self.base_delay_ms);

        loop {
            if cancel.is_cancelled() {
                return Err(LlmError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(LlmError::Cancelled),
                result = op() => result,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if matches!(error, LlmError::Cancelled)
                || classify_retryable(&error) == RetryClass::Fatal
            {
                debug!("{context}: fatal error, not retrying: {error}");
                return Err(error);
            }

            if state.is_last_attempt() {
                warn!(
                    "{context}: giving up after {} attempts: {error}",
                    state.attempt + 1
                );
                return Err(error);
            }

            let delay = state.delay();
            warn!(
                "{context}: retry attempt {}/{} after {}ms ({error})",
                state.attempt + 1,
                state.max_retries,
                delay.as_millis()
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            state.attempt += 1;
        }
    }
}
