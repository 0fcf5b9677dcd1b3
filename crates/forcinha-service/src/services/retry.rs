//! Retry with exponential backoff and a per-attempt timeout

use std::future::Future;
use std::time::Duration;

use forcinha_common::EsiConfig;
use forcinha_core::{UpstreamError, UpstreamResult};
use rand::Rng;
use tracing::warn;

/// Longest wait between two attempts, whatever the server asks for
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &EsiConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.backoff(),
            attempt_timeout: config.timeout(),
            jitter: true,
        }
    }

    /// Delay before attempt `attempt + 1`: base doubling per attempt, +/-25% jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        let delay = self.base_delay.saturating_mul(factor).min(MAX_BACKOFF);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        delay.mul_f64(rand::thread_rng().gen_range(0.75..=1.25))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    ///
    /// Timeouts, transport errors, rate limits and 5xx responses are retried.
    /// Each attempt is bounded by `attempt_timeout`.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> UpstreamResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = UpstreamResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let result = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::Timeout),
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= self.max_attempts {
                return Err(err);
            }

            let wait = match &err {
                UpstreamError::RateLimited {
                    retry_after: Some(retry_after),
                } => (*retry_after).min(MAX_BACKOFF),
                _ => self.backoff(attempt),
            };

            warn!(
                what,
                attempt,
                max_attempts = self.max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "Upstream request failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EsiConfig::default())
    }
}
