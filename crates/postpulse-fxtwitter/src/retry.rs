//! Retry with exponential back-off and jitter for status lookups.

use std::future::Future;
use std::time::Duration;

use crate::error::FxTwitterError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Timeouts, connection failures, HTTP 429 and 5xx are transient. A provider
/// `code`, a missing tweet or a malformed body will not change on retry.
pub(crate) fn is_retriable(err: &FxTwitterError) -> bool {
    match err {
        FxTwitterError::Http(e) => e.is_timeout() || e.is_connect(),
        FxTwitterError::Status { status } => *status == 429 || *status >= 500,
        FxTwitterError::Api { .. }
        | FxTwitterError::MissingTweet
        | FxTwitterError::InvalidBaseUrl(_)
        | FxTwitterError::Deserialize { .. } => false,
    }
}

/// Longest sleep between two attempts.
const MAX_DELAY_MS: u64 = 30_000;

/// Sleep before retry number `retry` (1-based): `base_ms × 2^(retry-1)`,
/// capped at [`MAX_DELAY_MS`], scaled by a jitter factor in `0.75..=1.25`.
fn backoff_delay(retry: u32, base_ms: u64) -> Duration {
    let exponent = retry.saturating_sub(1).min(10);
    let nominal = base_ms.saturating_mul(1u64 << exponent).min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (nominal as f64 * rand::random_range(0.75..=1.25)) as u64;
    Duration::from_millis(jittered)
}

/// Runs `operation` once, then retries transient failures up to `max_retries` times.
///
/// The default client policy is a single retry: a lookup that fails twice is
/// skipped by the caller.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FxTwitterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FxTwitterError>>,
{
    let mut retry = 0u32;
    let mut result = operation().await;
    while let Err(err) = &result {
        if retry == max_retries || !is_retriable(err) {
            break;
        }
        retry += 1;
        let delay = backoff_delay(retry, backoff_base_ms);
        tracing::debug!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "status lookup failed transiently; retrying"
        );
        tokio::time::sleep(delay).await;
        result = operation().await;
    }
    result
}
