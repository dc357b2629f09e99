//! Batch Processor — concurrent fan-out / fan-in over many analysis requests.
//!
//! Each request runs as its own tokio task; results come back in input order.
//! A task that dies (panic or abort) yields that item's local result.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::analysis::AnalysisResult;

use super::orchestrator::{AnalysisOrchestrator, AnalysisRequest};

/// One resume in a screening batch. `id` is generated when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    #[serde(default)]
    pub id: Option<String>,
    pub resume_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub id: String,
    pub result: AnalysisResult,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct BatchProcessor {
    orchestrator: AnalysisOrchestrator,
}

impl BatchProcessor {
    pub fn new(orchestrator: AnalysisOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run_all(&self, requests: Vec<AnalysisRequest>) -> Vec<AnalysisResult> {
        self.run_all_with_cancel(requests, &CancellationToken::new())
            .await
    }

    /// Runs every request concurrently. Output index `i` belongs to input `i`.
    ///
    /// The spawned tasks share a child of `cancel` that is also cancelled when
    /// this future is dropped, so an abandoned batch stops calling the model.
    pub async fn run_all_with_cancel(
        &self,
        requests: Vec<AnalysisRequest>,
        cancel: &CancellationToken,
    ) -> Vec<AnalysisResult> {
        info!("Batch: fanning out {} requests", requests.len());

        let batch_token = cancel.child_token();
        let _abandon_guard = batch_token.clone().drop_guard();

        let handles = requests.iter().cloned().map(|request| {
            let orchestrator = self.orchestrator.clone();
            let cancel = batch_token.clone();
            tokio::spawn(async move { orchestrator.run_with_cancel(&request, &cancel).await })
        });

        let joined = join_all(handles).await;

        joined
            .into_iter()
            .zip(requests.iter())
            .enumerate()
            .map(|(index, (outcome, request))| match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!("Batch: item {index} task failed ({e}), using local analysis");
                    self.orchestrator.local_fallback(request, None)
                }
            })
            .collect()
    }

    /// Scores every resume against one job description, pairing results with ids.
    pub async fn screen(
        &self,
        items: Vec<BatchItem>,
        job_description: Option<String>,
    ) -> Vec<BatchOutcome> {
        let ids: Vec<String> = items
            .iter()
            .map(|item| {
                item.id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| Uuid::new_v4().to_string())
            })
            .collect();

        let requests = items
            .into_iter()
            .map(|item| AnalysisRequest::ResumeScoring {
                resume_text: item.resume_text,
                job_description: job_description.clone(),
            })
            .collect();

        let results = self.run_all(requests).await;
        let analyzed_at = Utc::now();

        ids.into_iter()
            .zip(results)
            .map(|(id, result)| BatchOutcome {
                id,
                result,
                analyzed_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::heuristics::{KeywordHeuristicAnalyzer, LocalAnalyzer};
    use crate::llm_client::backoff::BackoffExecutor;
    use crate::llm_client::mock::{Reply, ScriptedModel};
    use crate::llm_client::LanguageModel;
    use crate::models::analysis::AnalysisMode;
    use tokio::time::Instant;

    /// Replies with the score embedded in the resume (`score-NN`) after a
    /// delay that shrinks with position, so later items finish first.
    fn skewed_model() -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new(|request, _| {
            let score = request
                .prompt
                .split("score-")
                .nth(1)
                .and_then(|rest| rest.get(..2))
                .and_then(|n| n.parse::<u64>().ok())
                .unwrap_or(0);
            if request.prompt.contains("PANIC") {
                panic!("scripted model failure");
            }
            let delay = Duration::from_millis(1000 - score * 10);
            let body = format!(
                r#"{{"score": {score}, "strengths": ["s"], "weaknesses": ["w"]}}"#
            );
            (delay, Reply::Text(body))
        }))
    }

    fn processor(model: Option<Arc<ScriptedModel>>) -> BatchProcessor {
        BatchProcessor::new(AnalysisOrchestrator::new(
            model.map(|m| m as Arc<dyn LanguageModel>),
            BackoffExecutor::default(),
            Arc::new(KeywordHeuristicAnalyzer),
        ))
    }

    fn scoring(resume_text: &str) -> AnalysisRequest {
        AnalysisRequest::ResumeScoring {
            resume_text: resume_text.to_string(),
            job_description: Some("Python developer".to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_input_order_under_skewed_delays() {
        let requests: Vec<AnalysisRequest> = [10, 30, 50, 70, 90]
            .iter()
            .map(|n| scoring(&format!("candidate score-{n}")))
            .collect();
        let started = Instant::now();

        let results = processor(Some(skewed_model())).run_all(requests).await;

        let scores: Vec<u8> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![10, 30, 50, 70, 90]);
        assert!(results.iter().all(|r| r.mode == AnalysisMode::RemoteStructured));
        // Concurrent: total time is the slowest item, not the sum.
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_failed_task_becomes_local_result() {
        let requests = vec![scoring("candidate score-80"), scoring("PANIC candidate")];

        let results = processor(Some(skewed_model())).run_all(requests).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 80);
        assert_eq!(results[1].mode, AnalysisMode::Local);
        assert_eq!(
            results[1],
            KeywordHeuristicAnalyzer.analyze("PANIC candidate", Some("Python developer"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_batch_stops_remote_calls() {
        let model = Arc::new(ScriptedModel::always(Reply::fail(503, "Service Unavailable")));
        let requests = (0..3)
            .map(|i| AnalysisRequest::JobSeekerReview {
                resume_text: format!("resume {i}"),
            })
            .collect();

        // Each item is in its first backoff wait when the caller gives up.
        let outcome = tokio::time::timeout(
            Duration::from_millis(100),
            processor(Some(model.clone())).run_all(requests),
        )
        .await;
        assert!(outcome.is_err());
        let calls_at_drop = model.calls();
        assert_eq!(calls_at_drop, 3);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(model.calls(), calls_at_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_batch_returns_local_results() {
        let model = Arc::new(ScriptedModel::always(Reply::fail(503, "Service Unavailable")));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let results = processor(Some(model.clone()))
            .run_all_with_cancel(vec![scoring("a"), scoring("b")], &cancel)
            .await;

        assert_eq!(model.calls(), 2);
        assert!(results.iter().all(|r| r.mode == AnalysisMode::Local));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        assert!(processor(None).run_all(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_screen_pairs_ids_and_generates_missing_ones() {
        let items = vec![
            BatchItem {
                id: Some("cand-1".to_string()),
                resume_text: "Ana Silva\n4 years of python".to_string(),
            },
            BatchItem {
                id: None,
                resume_text: "Ben Okafor\n2 years of java".to_string(),
            },
        ];

        let outcomes = processor(None)
            .screen(items, Some("python engineer".to_string()))
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].id, "cand-1");
        assert_eq!(outcomes[0].result.extracted_info.name, "Ana Silva");
        assert!(Uuid::parse_str(&outcomes[1].id).is_ok());
        assert_eq!(outcomes[1].result.extracted_info.name, "Ben Okafor");
    }

    #[test]
    fn test_batch_item_deserializes_camel_case() {
        let item: BatchItem =
            serde_json::from_str(r#"{"resumeText": "text"}"#).unwrap();
        assert_eq!(item.id, None);
        assert_eq!(item.resume_text, "text");
    }
}
