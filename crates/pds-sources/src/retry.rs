//! Exponential back-off for the source HTTP clients.
//!
//! Only errors for which [`SourceClientError::is_transport`] holds are
//! retried, so a retry here and an `Unavailable` page failure always agree.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceClientError;

const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based), before jitter.
pub(crate) fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64 << attempt.saturating_sub(1).min(10);
    backoff_base_ms.saturating_mul(factor).min(MAX_DELAY_MS)
}

/// Scales `delay_ms` by a random factor in `[0.75, 1.25)`.
fn jittered(delay_ms: u64) -> Duration {
    let factor = 0.75 + rand::random::<f64>() / 2.0;
    Duration::from_millis(delay_ms).mul_f64(factor)
}

/// Calls `operation` once, then up to `max_retries` more times while it
/// keeps failing with a transport error.
///
/// With `backoff_base_ms = 1_000` the waits are about 1 s, 2 s, 4 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SourceClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceClientError>>,
{
    let mut retries_left = max_retries;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries_left == 0 || !err.is_transport() => return Err(err),
            Err(err) => err,
        };
        retries_left -= 1;
        let retry = max_retries - retries_left;
        let delay = jittered(backoff_delay_ms(backoff_base_ms, retry));
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "source request failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
