//! # Retry Module
//!
//! Runs outbound calls with a per-attempt timeout, exponential backoff with
//! jitter, and circuit breaker bookkeeping.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::RecoveryConfig;
use crate::errors::{AppError, AppResult};

/// Delay before retry number `attempt` (1-based), in milliseconds
///
/// Doubles from `base_retry_delay_ms`, capped at `max_retry_delay_ms`, plus
/// up to 25% random jitter.
pub fn calculate_retry_delay(attempt: u32, recovery: &RecoveryConfig) -> u64 {
    let exponent = attempt.saturating_sub(1).min(16);
    let backoff = recovery
        .base_retry_delay_ms
        .saturating_mul(1u64 << exponent);
    let capped = backoff.min(recovery.max_retry_delay_ms);

    let jitter = if capped >= 4 {
        rand::thread_rng().gen_range(0..=capped / 4)
    } else {
        0
    };

    capped + jitter
}

/// Run `operation` under the breaker and retry policy
///
/// Only transient errors (see [`AppError::is_transient`]) are retried and
/// counted against the breaker. Anything else is returned at once.
pub async fn with_recovery<T, F, Fut>(
    breaker: &CircuitBreaker,
    recovery: &RecoveryConfig,
    mut operation: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    if breaker.is_open() {
        return Err(AppError::Unavailable(format!(
            "{} is temporarily unavailable",
            breaker.name()
        )));
    }

    let timeout = Duration::from_secs(recovery.operation_timeout_secs);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let outcome = match tokio::time::timeout(timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} did not answer within {}s",
                breaker.name(),
                recovery.operation_timeout_secs
            ))),
        };

        match outcome {
            Ok(value) => {
                breaker.record_success();
                return Ok(value);
            }
            Err(err) if err.is_transient() => {
                breaker.record_failure();

                if attempt > recovery.max_retries || breaker.is_open() {
                    warn!(
                        service = breaker.name(),
                        attempts = attempt,
                        error = %err,
                        "Giving up on upstream call"
                    );
                    return Err(err);
                }

                let delay = calculate_retry_delay(attempt, recovery);
                warn!(
                    service = breaker.name(),
                    attempt,
                    delay_ms = delay,
                    error = %err,
                    "Upstream call failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Err(err) => return Err(err),
        }
    }
}
