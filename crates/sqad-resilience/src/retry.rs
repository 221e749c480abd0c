use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Deterministic exponential-backoff retry for transient failures.
///
/// The delay for attempt `n` (0-based) is `initial_delay * backoff_factor^n`,
/// capped at `max_delay`. No jitter: tests rely on the deterministic bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum retries. Total attempts = `retries + 1`.
    pub retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_delay: Duration, backoff_factor: f64, max_delay: Duration) -> Self {
        Self {
            retries,
            initial_delay,
            backoff_factor,
            max_delay,
        }
    }

    /// Disable retries entirely (single attempt).
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// Delay before the retry following attempt `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scale = self.backoff_factor.powi(attempt as i32);
        let seconds = self.initial_delay.as_secs_f64() * scale;
        Duration::from_secs_f64(seconds.min(self.max_delay.as_secs_f64()))
    }

    /// Invoke `f`, retrying errors accepted by `retryable` with backoff
    /// sleeps between attempts. The sleep suspends only this task; concurrent
    /// work keeps running. After exhaustion the last error is returned.
    pub async fn run<T, E, F, Fut>(&self, retryable: impl Fn(&E) -> bool, mut f: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.retries && retryable(&error) => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
