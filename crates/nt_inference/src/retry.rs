use std::future::Future;
use std::time::Duration;

use nt_core::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: f64 = 1.5;
/// Upper bound on a single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, backoff_base: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Like [`RetryPolicy::new`], but rejects a base that is not a finite
    /// number of at least 1.
    pub fn try_new(max_attempts: u32, backoff_base: f64) -> Result<Self> {
        if !backoff_base.is_finite() || backoff_base < 1.0 {
            return Err(Error::Config(format!(
                "backoff base must be a finite number >= 1, got {}",
                backoff_base
            )));
        }
        Ok(Self::new(max_attempts, backoff_base))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_base(&self) -> f64 {
        self.backoff_base
    }

    /// Wait after the failed zero-indexed `attempt`: `backoff_base ^ attempt`
    /// seconds, capped at [`MAX_BACKOFF`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_base.powi(exponent).max(0.0);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Runs `action` until it yields a value accepted by `is_valid`.
///
/// Every failed attempt (an error, or a value rejected by `is_valid`) logs one
/// warning. Between attempts the task sleeps for [`RetryPolicy::delay_for`].
/// When the budget is spent, the last failure is returned; a rejected value
/// surfaces as [`Error::Validation`]. Errors that are not
/// [`Error::is_retryable`] are returned at once, without a warning or a sleep.
pub async fn retry_validated<F, Fut, T, P>(
    policy: &RetryPolicy,
    label: &str,
    mut action: F,
    is_valid: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        let error = match action().await {
            Ok(value) if is_valid(&value) => return Ok(value),
            Ok(_) => Error::Validation(format!("{} response failed validation", label)),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        tracing::warn!(
            label,
            attempt = attempt + 1,
            max_attempts,
            error = %error,
            "Model attempt {}/{} failed",
            attempt + 1,
            max_attempts
        );

        if attempt + 1 >= max_attempts {
            return Err(error);
        }

        tokio::time::sleep(policy.delay_for(attempt)).await;
        attempt += 1;
    }
}
