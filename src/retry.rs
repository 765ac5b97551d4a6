//! Small retry combinator used for the per-part submission step.
//!
//! Session start and finalize are deliberately *not* routed through this:
//! those surface immediately and are only retried by the caller.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff: `base * 2^attempt`, optionally capped.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Option<Duration>,
}

impl BackoffPolicy {
    pub fn exponential(base: Duration) -> Self {
        Self { base, max: None }
    }

    pub fn with_max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    /// Delay to sleep after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let delay = self.base.saturating_mul(factor);
        match self.max {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Run `op` up to `max_attempts` times, sleeping per `policy` between
/// failures. Returns the first success, or the error from the final attempt.
pub async fn retry<T, E, F, Fut>(
    max_attempts: u32,
    policy: BackoffPolicy,
    mut op: F,
) -> Result<T, (E, u32)>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    debug_assert!(max_attempts > 0);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => return Err((err, attempt)),
            Err(err) => {
                let delay = policy.delay(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, backing off: {}",
                    err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
