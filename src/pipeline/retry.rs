//! Bounded retry with linearly increasing delay.
//!
//! A [`RetryPolicy`] is a value applied around a call site, not an attribute
//! on a function. Attempt `n` (1-based) that fails is followed by a sleep of
//! `delay × n` before attempt `n + 1`. When every attempt fails the last
//! error is returned unchanged.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
    /// Base delay, multiplied by the failed attempt's number.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A policy that tries once and never sleeps.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Sleep taken after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// `what` names the operation in log lines.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        "{what} failed (attempt {attempt}/{}): {e}; retrying in {:?}",
                        self.max_attempts, wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
