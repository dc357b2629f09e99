use chrono::{DateTime, Utc};

use crate::analysis::batch::BatchProcessor;
use crate::analysis::orchestrator::AnalysisOrchestrator;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Fallback-chain orchestrator. Holds the injected model client (if any)
    /// and the local analyzer.
    pub orchestrator: AnalysisOrchestrator,
    pub batch: BatchProcessor,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: AnalysisOrchestrator) -> Self {
        let batch = BatchProcessor::new(orchestrator.clone());
        Self {
            config,
            orchestrator,
            batch,
            started_at: Utc::now(),
        }
    }
}
