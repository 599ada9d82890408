//! Retry with exponential backoff for flaky remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Attempts made on top of the first call.
pub const DEFAULT_RETRIES: u32 = 3;

/// Delay before the first retry; doubles on each subsequent one.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Run `op` until it succeeds, the error is not retryable, or the attempt
/// budget is exhausted. The last error is returned unchanged.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_retries: u32,
    initial_delay: Duration,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;

    for attempt in 0..=max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("loop returns on the final attempt")
}
