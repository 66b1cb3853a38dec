use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "SUCCESS",
            AttemptOutcome::RetryableFailure => "RETRYABLE_FAILURE",
            AttemptOutcome::FatalFailure => "FATAL_FAILURE",
        }
    }
}

/// One try of one model. Lives only for the duration of an orchestration.
#[derive(Debug, Clone)]
pub struct ModelAttempt<'a> {
    pub model: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

impl ModelAttempt<'_> {
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn log(&self, detail: Option<&str>) {
        match self.outcome {
            AttemptOutcome::Success => tracing::info!(
                model = self.model,
                attempt = self.attempt,
                elapsed_ms = self.elapsed_ms(),
                outcome = self.outcome.as_str(),
                "Attempt {}/{} succeeded",
                self.attempt,
                self.max_attempts
            ),
            AttemptOutcome::RetryableFailure => tracing::warn!(
                model = self.model,
                attempt = self.attempt,
                elapsed_ms = self.elapsed_ms(),
                outcome = self.outcome.as_str(),
                "Attempt {}/{} failed with retryable error: {}",
                self.attempt,
                self.max_attempts,
                detail.unwrap_or_default()
            ),
            AttemptOutcome::FatalFailure => tracing::error!(
                model = self.model,
                attempt = self.attempt,
                elapsed_ms = self.elapsed_ms(),
                outcome = self.outcome.as_str(),
                "Attempt {}/{} failed with non-retryable error: {}",
                self.attempt,
                self.max_attempts,
                detail.unwrap_or_default()
            ),
        }
    }
}
