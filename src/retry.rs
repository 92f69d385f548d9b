//! C13: the retry controller (spec §4.12).
//!
//! Wraps an inner async call, retrying retriable failures (and select
//! status codes) with exponential backoff plus jitter. Grounded on the
//! policy/budget shape of `penumbra-x-rquest/src/retry.rs`, simplified to
//! a plain max-attempts policy since the spec has no retry-budget
//! requirement.

use std::time::Duration;

use rand::Rng;

use crate::transport::RawResponse;

/// Status codes that are retried in addition to connection/timeout
/// failures (spec §4.12).
const RETRIABLE_STATUSES: [u16; 8] = [408, 429, 500, 502, 503, 504, 507, 511];

/// Exponential backoff configuration: attempt `k` (0-indexed) waits
/// `min(base * 2^k, max_delay)`, then a uniform jitter factor in
/// `[0.5, 1.0]` is applied.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Backoff {
        Backoff {
            base: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = exp.min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.5..=1.0);
        Duration::from_secs_f64(capped * jitter)
    }
}

pub(crate) fn is_retriable_status(status: u16) -> bool {
    RETRIABLE_STATUSES.contains(&status)
}

/// Retries `f` up to `max_retries` additional times per spec §4.12: `0`
/// means execute once with no retries. `f` yields a `RawResponse` on
/// success (even a retriable status), letting the caller loop without
/// treating 5xx as an `Err`.
pub async fn with_retry<F, Fut>(
    max_retries: u32,
    backoff: Backoff,
    mut f: F,
) -> crate::Result<RawResponse>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = crate::Result<RawResponse>>,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(response) if is_retriable_status(response.status) && attempt < max_retries => {
                tokio::time::sleep(backoff.delay_for(attempt)).await;
                attempt += 1;
            }
            Ok(response) => return Ok(response),
            Err(e) if e.is_retriable() && attempt < max_retries => {
                tokio::time::sleep(backoff.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(e) if e.is_retriable() => return Err(crate::Error::retry_exhausted(e)),
            Err(e) => return Err(e),
        }
    }
}
