use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, uptime, and which analysis mode is active.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let (mode, model) = if state.orchestrator.has_model() {
        ("remote", Some(state.config.gemini_model.as_str()))
    } else {
        ("local", None)
    };

    let now = Utc::now();

    Json(json!({
        "status": "ok",
        "timestamp": now.to_rfc3339(),
        "uptimeSecs": (now - state.started_at).num_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "screening-api",
        "analysisMode": mode,
        "model": model
    }))
}
