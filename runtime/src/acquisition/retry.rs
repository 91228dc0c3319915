//! Retry policies for the fetch engine.
//!
//! Two policies live here:
//!
//! - [`retry_with_backoff`] wraps chapter-page discovery: a bounded number
//!   of attempts with an exponential wait clamped to `[4, 10]` time-units.
//! - [`attempt_until_success`] wraps single picture fetches: a fixed number
//!   of immediate attempts where only a 2xx response counts as success.

use crate::acquisition::http_client::FetchResponse;
use crate::error::{FetchError, Result};
use std::future::Future;
use std::time::Duration;

/// Floor of the discovery wait, in time-units.
pub const MIN_WAIT_UNITS: u64 = 4;
/// Ceiling of the discovery wait, in time-units.
pub const MAX_WAIT_UNITS: u64 = 10;

/// Exponential backoff schedule: `clamp(unit * 2^(n-1), 4 units, 10 units)`
/// after the n-th failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    attempts: u32,
    unit: Duration,
}

impl Backoff {
    /// `attempts` is the total number of tries, including the first.
    pub fn new(attempts: u32, unit: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            unit,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Wait after the `attempt`-th failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
        let units = exp.clamp(MIN_WAIT_UNITS, MAX_WAIT_UNITS);
        self.unit.saturating_mul(units as u32)
    }

    /// Every wait the policy can apply, in order.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.attempts).map(move |n| self.delay(n))
    }
}

/// Run `op` until it succeeds, retrying transient errors with `backoff`.
///
/// `op` receives the 1-based attempt number. Non-transient errors are
/// returned immediately; a transient error on the final attempt becomes
/// [`FetchError::RetriesExhausted`].
pub async fn retry_with_backoff<T, F, Fut>(backoff: &Backoff, url: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < backoff.attempts => {
                let delay = backoff.delay(attempt);
                tracing::warn!(
                    "attempt {attempt}/{} for {url} failed: {e}; retrying in {delay:?}",
                    backoff.attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_transient() => {
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetch a picture up to `attempts` times, succeeding on the first 2xx.
///
/// Transport errors count as failed attempts. Exhaustion yields
/// [`FetchError::PictureDownloadExhausted`].
pub async fn attempt_until_success<F, Fut>(
    attempts: u32,
    url: &str,
    mut op: F,
) -> Result<FetchResponse>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<FetchResponse>>,
{
    let attempts = attempts.max(1);
    let mut reason = String::new();
    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(resp) if resp.is_success() => return Ok(resp),
            Ok(resp) => {
                reason = format!("HTTP {}", resp.status);
                tracing::debug!("picture {url} attempt {attempt}/{attempts}: {reason}");
            }
            Err(e @ FetchError::InvalidCachePath(_)) => return Err(e),
            Err(e) => {
                reason = e.to_string();
                tracing::debug!("picture {url} attempt {attempt}/{attempts}: {reason}");
            }
        }
    }
    Err(FetchError::PictureDownloadExhausted {
        url: url.to_string(),
        attempts,
        reason,
    })
}
