//! Exponential backoff retry for HTTP collaborators.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::debug;

/// Configuration: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// How often and how patiently a collaborator retries transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
            max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to `policy.max_attempts` times. Errors for which
/// `is_transient` returns false are returned immediately; transient errors
/// are retried after an exponentially increasing sleep. The last error is
/// returned once attempts run out.
pub async fn retry_with_backoff<T, E, Fut, F, P>(
    policy: RetryPolicy,
    mut attempt: F,
    is_transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        max_interval: policy.max_interval,
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= policy.max_attempts || !is_transient(&e) {
                    return Err(e);
                }
                debug!(attempt = attempts, error = %e, "Transient failure, retrying");
                if let Some(wait_duration) = backoff.next_backoff() {
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }
    }
}

/// Whether an HTTP status is worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
