//! Bounded retry with capped exponential backoff, used for Wi-Fi association.

use embassy_time::{Duration, Timer};
use log::info;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Upper bound the caller should place on each individual attempt.
    pub attempt_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            attempt_timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): the initial backoff,
    /// doubled per attempt, never above `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let ticks = self.initial_backoff.as_ticks().saturating_mul(factor);
        Duration::from_ticks(ticks.min(self.max_backoff.as_ticks()))
    }

    pub fn start(&self) -> Retry {
        Retry {
            policy: *self,
            attempt: 0,
        }
    }
}

/// Progress through one retry sequence.
///
/// ```ignore
/// let mut retry = policy.start();
/// loop {
///     retry.begin_attempt()?;
///     if try_once().await.is_ok() {
///         break;
///     }
///     retry.backoff().await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Retry {
    policy: RetryPolicy,
    attempt: u32,
}

impl Retry {
    /// Claim the next attempt, or fail once the policy is used up.
    pub fn begin_attempt(&mut self) -> Result<u32, RetryError> {
        if self.attempt >= self.policy.max_attempts {
            return Err(RetryError::Exhausted {
                attempts: self.attempt,
            });
        }
        self.attempt += 1;
        Ok(self.attempt)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sleep for the backoff that follows the current attempt.
    pub async fn backoff(&self) {
        let delay = self.policy.backoff_for(self.attempt);
        info!(
            "Attempt {}/{} failed, retrying in {} ms",
            self.attempt,
            self.policy.max_attempts,
            delay.as_millis()
        );
        Timer::after(delay).await;
    }
}
