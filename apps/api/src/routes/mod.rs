pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::errors::AppError;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analysis/resume", post(handlers::handle_analyze_resume))
        .route("/api/v1/analysis/review", post(handlers::handle_review_resume))
        .route("/api/v1/analysis/batch", post(handlers::handle_batch))
        // Interview API
        .route("/api/v1/interview/questions", post(handlers::handle_questions))
        .route("/api/v1/interview/process", post(handlers::handle_process))
        .route("/api/v1/interview/finalize", post(handlers::handle_finalize))
        .route("/api/v1/interview/critique", post(handlers::handle_critique))
        .route(
            "/api/v1/interview/conversation",
            post(handlers::handle_conversation),
        )
        .fallback(not_found)
        .with_state(state)
}
