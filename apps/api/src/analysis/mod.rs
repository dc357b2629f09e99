// Analysis core: the fallback-chain orchestrator, the interview flow built on
// it, and the concurrent batch runner.
// All model calls go through llm_client; all parsing goes through parsing.

pub mod batch;
pub mod handlers;
pub mod interview;
pub mod normalize;
pub mod orchestrator;
pub mod prompts;
