//! Bounded retry with exponential backoff
//!
//! | Outcome of an attempt | Action |
//! |-----------------------|--------|
//! | Success | Return immediately |
//! | Non-retryable error | Return immediately, no sleep |
//! | Retryable error, attempts left | Sleep, grow the delay, try again |
//! | Retryable error, last attempt | Return that error |
//! | Cancellation (before an attempt or during a sleep) | Return `Cancelled` |

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that know whether a later attempt might succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Failure of a retried operation
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("operation cancelled")]
    Cancelled,

    #[error("{error} (after {attempts} attempt(s))")]
    Failed { error: E, attempts: u32 },
}

impl<E> RetryError<E> {
    /// Returns the last operation error, if there was one
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Cancelled => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Substrings that mark an opaque failure message as transient
const RETRYABLE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "connection",
    "network",
    "temporary",
    "temporarily unavailable",
];

/// Classifies free-form failure text (e.g. a browser's stderr)
///
/// Matches case-insensitively against timeout, connection, network and
/// temporary-failure wording.
pub fn is_retryable_message(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

/// Runs `operation` until it succeeds, fails permanently, runs out of
/// attempts, or `cancel` fires
///
/// `policy.max_retries` counts retries after the first attempt, so the
/// operation is invoked at most `max_retries + 1` times.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        let attempts = attempt + 1;

        if !error.is_retryable() {
            tracing::debug!("Permanent failure on attempt {}: {}", attempts, error);
            return Err(RetryError::Failed { error, attempts });
        }

        if attempt >= policy.max_retries {
            tracing::debug!("Giving up after {} attempt(s): {}", attempts, error);
            return Err(RetryError::Failed { error, attempts });
        }

        tracing::debug!(
            "Attempt {}/{} failed ({}), retrying in {:?}",
            attempts,
            policy.max_retries + 1,
            error,
            delay
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, policy);
        attempt += 1;
    }
}

/// Multiplies the delay, capped at `max_delay`
fn next_delay(current: Duration, policy: &RetryConfig) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * policy.backoff_multiplier)
        .unwrap_or(policy.max_delay)
        .min(policy.max_delay)
}
