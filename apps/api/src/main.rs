mod analysis;
mod config;
mod errors;
mod heuristics;
mod llm_client;
mod models;
mod parsing;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::AnalysisOrchestrator;
use crate::config::Config;
use crate::heuristics::KeywordHeuristicAnalyzer;
use crate::llm_client::backoff::BackoffExecutor;
use crate::llm_client::{GeminiClient, LanguageModel};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screening API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client; without a key every analysis runs locally
    let model: Option<Arc<dyn LanguageModel>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(
                key.clone(),
                config.gemini_model.clone(),
                config.llm_timeout_secs,
            )?;
            info!("LLM client initialized (model: {})", client.model_name());
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set, all analysis will use the local analyzer");
            None
        }
    };

    let executor = BackoffExecutor::new(config.llm_max_retries, config.llm_base_delay_ms);
    info!(
        "Backoff: {} retries, {}ms base delay",
        executor.max_retries(),
        config.llm_base_delay_ms
    );

    let orchestrator =
        AnalysisOrchestrator::new(model, executor, Arc::new(KeywordHeuristicAnalyzer));

    // Build app state
    let state = AppState::new(config.clone(), orchestrator);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
