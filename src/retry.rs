use crate::errors::AttemptError;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Lowercased fragments of upstream error text that mark a transient failure.
const RETRYABLE_MARKERS: &[&str] = &[
    "503",
    "unavailable",
    "overloaded",
    "429",
    "resource_exhausted",
    "rate limit",
    "too many requests",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Sleep and try the same model again.
    Retryable,
    /// Abandon the current model and move down the chain.
    Fatal,
}

pub fn classify(err: &AttemptError) -> Disposition {
    match err {
        AttemptError::Timeout(_) => Disposition::Retryable,
        AttemptError::Parse(_) | AttemptError::Schema(_) => Disposition::Fatal,
        other => {
            let text = other.to_string().to_lowercase();
            if RETRYABLE_MARKERS.iter().any(|marker| text.contains(marker)) {
                Disposition::Retryable
            } else {
                Disposition::Fatal
            }
        }
    }
}

/// Bounded per-model retry with geometric backoff (ratio 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Delays between attempts; one fewer than `max_attempts`.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> {
        let policy = self.clone();
        (1..policy.max_attempts).map(move |attempt| policy.delay_for(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_wrapper::ProviderError;
    use crate::schemas::shapes::SchemaViolation;
    use reqwest::StatusCode;

    fn status(code: StatusCode, body: &str) -> AttemptError {
        AttemptError::Provider(ProviderError::Status {
            status: code,
            body: body.to_string(),
        })
    }

    #[test]
    fn upstream_overload_markers_are_retryable() {
        assert_eq!(
            classify(&status(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")),
            Disposition::Retryable
        );
        assert_eq!(
            classify(&status(StatusCode::TOO_MANY_REQUESTS, "RESOURCE_EXHAUSTED")),
            Disposition::Retryable
        );
        assert_eq!(
            classify(&AttemptError::Aborted("The model is overloaded".into())),
            Disposition::Retryable
        );
    }

    #[test]
    fn timeout_is_retryable() {
        assert_eq!(
            classify(&AttemptError::Timeout(Duration::from_secs(12))),
            Disposition::Retryable
        );
    }

    #[test]
    fn bad_output_and_other_errors_are_fatal() {
        assert_eq!(classify(&AttemptError::Parse("eof".into())), Disposition::Fatal);
        assert_eq!(
            classify(&AttemptError::Schema(SchemaViolation {
                shape: "HintShape",
                reason: "missing field `hint`".into(),
            })),
            Disposition::Fatal
        );
        assert_eq!(
            classify(&status(StatusCode::BAD_REQUEST, "API key not valid")),
            Disposition::Fatal
        );
    }

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn schedule_has_one_delay_per_retry() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };

        let delays: Vec<_> = policy.schedule().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
        assert_eq!(RetryPolicy { max_attempts: 1, ..policy }.schedule().count(), 0);
    }

    #[test]
    fn huge_attempt_numbers_do_not_overflow() {
        assert_eq!(
            RetryPolicy::default().delay_for(64),
            Duration::from_secs(u64::from(u32::MAX))
        );
    }
}
