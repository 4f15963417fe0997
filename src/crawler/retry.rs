//! Retry policy for transient fetch failures
//!
//! The policy knows nothing about HTTP: it drives any attempt closure that
//! reports either a final value or a retryable reason, sleeping a linearly
//! growing delay between attempts.

use std::future::Future;
use std::time::Duration;

/// Result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// Final outcome; no further attempts
    Done(T),

    /// Transient failure with its reason
    Retry(String),
}

/// All attempts failed transiently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    /// Number of attempts made
    pub attempts: u32,

    /// Reason reported by the final attempt
    pub last_reason: String,
}

/// Bounded attempts with linear backoff
///
/// After failed attempt `n` (1-based) the policy waits `backoff * n` before
/// attempt `n + 1`. No delay follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    /// Runs `op` until it returns [`Attempt::Done`] or the budget is spent
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            match op(attempt).await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Retry(reason) => {
                    last_reason = reason;
                    if attempt < max_attempts {
                        let delay = self.delay_after(attempt);
                        tracing::trace!("Backing off {:?} before attempt {}", delay, attempt + 1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(RetryExhausted {
            attempts: max_attempts,
            last_reason,
        })
    }
}
