use crate::errors::AttemptError;
use crate::llm_wrapper::{GenerationOptions, ModelProvider};
use std::sync::Arc;
use std::time::Duration;

/// Runs one model invocation against a deadline.
///
/// The invocation is spawned as its own task. When the deadline fires first
/// the task is left running and its eventual output is dropped with the
/// detached handle; nothing it returns reaches the caller or shared state.
pub async fn guarded_invoke(
    provider: Arc<dyn ModelProvider>,
    model: &str,
    prompt: &str,
    options: &GenerationOptions,
    deadline: Duration,
) -> Result<String, AttemptError> {
    let model = model.to_string();
    let prompt = prompt.to_string();
    let options = options.clone();

    let handle =
        tokio::spawn(async move { provider.invoke(&model, &prompt, &options).await });

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(result)) => result.map_err(AttemptError::from),
        Ok(Err(join_error)) => Err(AttemptError::Aborted(join_error.to_string())),
        Err(_) => Err(AttemptError::Timeout(deadline)),
    }
}
