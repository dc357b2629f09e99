use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::backoff::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES};
use crate::llm_client::DEFAULT_MODEL;

/// Value shipped in `.env.example`; treated the same as an unset key.
const PLACEHOLDER_API_KEY: &str = "your-gemini-api-key-here";

/// Application configuration loaded from environment variables.
/// Nothing is required: without a Gemini key every analysis runs locally.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub llm_max_retries: u32,
    pub llm_base_delay_ms: u64,
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY);

        Ok(Config {
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_max_retries: parse_or(&lookup, "LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            llm_base_delay_ms: parse_or(&lookup, "LLM_BASE_DELAY_MS", DEFAULT_BASE_DELAY_MS)?,
            llm_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", 60)?,
            port: parse_or(&lookup, "PORT", 5001)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
