//! Transport Retry Logic
//!
//! Retries an operation a bounded number of times when it fails with a transient
//! error (connection refused, timeout). Anything else is returned immediately.

use std::time::Duration;

const INITIAL_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 1000;

/// Run `operation`, retrying up to `max_retries` extra times on transient errors.
///
/// **Backoff Strategy:**
/// - Initial delay: 100ms
/// - Max delay: 1000ms
/// - Multiplier: 2.0 (exponential)
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., the shortcode being looked up)
/// * `max_retries` - Retries after the first attempt; 0 disables retrying
/// * `is_transient` - Classifies an error as worth retrying
/// * `operation` - Async closure performing one attempt
pub async fn retry_transient<F, Fut, T, E, P>(
    operation_name: &str,
    max_retries: u32,
    is_transient: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_transient(&err) || attempt > max_retries {
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    error = %err,
                    "Transient transport error, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}
