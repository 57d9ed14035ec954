//! Retry strategies for the liveness check.
//!
//! Remote reads never retry by themselves. The poller uses a strategy only
//! after an anchor-level failure, to tell a busy process from a dead one.

use std::time::Duration;

use crate::config::retry as retry_config;

pub trait RetryStrategy {
    /// Total attempts, including the first. Never less than one in practice.
    fn max_attempts(&self) -> u32;

    /// Delay after the given failed attempt (0-indexed), if any.
    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration>;

    /// Call `f` until it succeeds or the attempts run out.
    ///
    /// The error of the last attempt is returned.
    fn execute<T, E, F>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let max = self.max_attempts().max(1);
        let mut attempt = 0;

        loop {
            match f(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 >= max => return Err(e),
                Err(_) => {
                    if let Some(delay) = self.delay_for_attempt(attempt) {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Doubling delays from `config::retry`, 100ms up to 1.6s.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max_attempts: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ExponentialBackoff {
    pub fn new() -> Self {
        Self {
            max_attempts: retry_config::MAX_LIVENESS_RETRIES,
        }
    }

    /// Same delays with a different attempt count, e.g. from `PollingConfig`.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        // attempts past the table reuse the longest delay
        let delays = &retry_config::RETRY_DELAYS_MS;
        let index = (attempt as usize).min(delays.len() - 1);
        Some(Duration::from_millis(delays[index]))
    }
}

#[derive(Debug, Clone)]
pub struct FixedDelay {
    max_attempts: u32,
    delay: Duration,
}

impl FixedDelay {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl RetryStrategy for FixedDelay {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay_for_attempt(&self, _attempt: u32) -> Option<Duration> {
        Some(self.delay)
    }
}

/// One attempt, no waiting. Used by tests and one-shot commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn max_attempts(&self) -> u32 {
        1
    }

    fn delay_for_attempt(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}
