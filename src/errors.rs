use crate::llm_wrapper::ProviderError;
use crate::schemas::shapes::SchemaViolation;
use std::time::Duration;

/// Failure of a single model attempt. Never escapes the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("LLM request timeout after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("model invocation aborted: {0}")]
    Aborted(String),
    #[error("invalid JSON in model output: {0}")]
    Parse(String),
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

/// Failures surfaced to callers of the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("invalid generation request: {0}")]
    Validation(String),
    #[error("all models in the chain failed to produce a valid result")]
    AllModelsFailed {
        /// Short summary of the last failure, for logs and diagnostics.
        last_error: Option<String>,
    },
}
