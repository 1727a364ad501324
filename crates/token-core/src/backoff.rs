//! Bounded exponential backoff for rate-limited RPC reads.
//!
//! Only idempotent reads go through here. Whether a failure is worth retrying
//! is decided in exactly one place, `classify_failure`; everything that is
//! not rate limiting propagates on the first attempt.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TokenError;
use crate::rpc::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimited,
    Fatal,
}

/// Decide whether a failed read may be retried.
///
/// Rate limited means any of: an HTTP (or JSON-RPC) 429 status, a timeout,
/// or a "too many requests" message.
pub fn classify_failure(error: &RpcError) -> FailureClass {
    let has_status_429 = matches!(
        error,
        RpcError::Http { status: 429, .. } | RpcError::Rpc { code: 429, .. }
    );
    let is_timeout = matches!(error, RpcError::Timeout(_));
    let says_too_many_requests = error
        .to_string()
        .to_lowercase()
        .contains("too many requests");

    if has_status_429 || is_timeout || says_too_many_requests {
        FailureClass::RateLimited
    } else {
        FailureClass::Fatal
    }
}

/// Retry budget and delay growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_jitter_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1_500,
            multiplier: 1.5,
            max_jitter_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Delay sequence: `initial`, then `min(prev * multiplier + jitter, max)`.
#[derive(Debug)]
pub struct BackoffSchedule<'a, R> {
    policy: &'a RetryPolicy,
    previous_ms: Option<f64>,
    rng: &'a mut R,
}

impl<'a, R: Rng> BackoffSchedule<'a, R> {
    pub fn new(policy: &'a RetryPolicy, rng: &'a mut R) -> Self {
        Self {
            policy,
            previous_ms: None,
            rng,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let max = self.policy.max_delay_ms as f64;
        let next = match self.previous_ms {
            None => self.policy.initial_delay_ms as f64,
            Some(prev) => {
                let jitter = if self.policy.max_jitter_ms == 0 {
                    0.0
                } else {
                    self.rng.gen_range(0.0..=self.policy.max_jitter_ms as f64)
                };
                prev * self.policy.multiplier + jitter
            }
        }
        .min(max);

        self.previous_ms = Some(next);
        Duration::from_secs_f64(next / 1_000.0)
    }
}

/// Runs reads under a `RetryPolicy`. One controller can be reused for a
/// sequence of calls; each call starts a fresh delay schedule.
#[derive(Debug)]
pub struct RetryController<R = StdRng> {
    policy: RetryPolicy,
    rng: R,
}

impl RetryController<StdRng> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RetryController<R> {
    pub fn with_rng(policy: RetryPolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `op` until it succeeds, fails fatally, or the retry budget is spent.
    pub async fn run<T, F, Fut>(&mut self, label: &str, mut op: F) -> Result<T, TokenError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let max_attempts = self.policy.max_retries.saturating_add(1);
        let mut schedule = BackoffSchedule::new(&self.policy, &mut self.rng);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(%label, attempt, max_attempts, "calling RPC");

            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if classify_failure(&error) == FailureClass::Fatal {
                debug!(%label, attempt, %error, "not retrying fatal RPC failure");
                return Err(error.into());
            }

            if attempt >= max_attempts {
                warn!(%label, attempt, %error, "retry budget exhausted");
                return Err(TokenError::RetryExhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = schedule.next_delay();
            warn!(%label, attempt, ?delay, %error, "rate limited, backing off");
            tokio::time::sleep(delay).await;
        }
    }
}
