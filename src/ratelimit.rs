//! C12: rate limiting (spec §4.11).
//!
//! A token bucket plus a sliding-window alternative, each with blocking
//! and non-blocking acquire. Grounded on the throttling shape of
//! `ScriptSmith-hadrian/src/providers/retry.rs`'s backoff sibling code
//! (same crate family: `tokio::time::sleep` for the blocking wait, a
//! `Mutex`-guarded critical section for shared counters).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token-bucket rate limiter (spec §4.11): `tokens = min(capacity, tokens +
/// elapsed * rate)` refilled lazily on every `acquire`.
pub struct TokenBucket {
    capacity: f64,
    rate: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, rate: f64) -> TokenBucket {
        TokenBucket {
            capacity,
            rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(state: &mut BucketState, capacity: f64, rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * rate).min(capacity);
        state.last_refill = now;
    }

    /// Acquires `n` tokens, blocking (sleeping) until they are available.
    pub async fn acquire_blocking(&self, n: f64) {
        loop {
            let wait = {
                let mut state = self.state.lock().expect("rate limiter mutex poisoned");
                Self::refill(&mut state, self.capacity, self.rate);
                if state.tokens >= n {
                    state.tokens -= n;
                    return;
                }
                Duration::from_secs_f64((n - state.tokens) / self.rate)
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Attempts to acquire `n` tokens without waiting; on failure returns
    /// `RateLimitExceeded` carrying the wait time the caller would need.
    pub fn try_acquire(&self, n: f64) -> crate::Result<()> {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");
        Self::refill(&mut state, self.capacity, self.rate);
        if state.tokens >= n {
            state.tokens -= n;
            Ok(())
        } else {
            let retry_after = Duration::from_secs_f64((n - state.tokens) / self.rate);
            Err(crate::Error::rate_limited(retry_after))
        }
    }
}

/// A sliding-window limiter: counts events in a moving window rather than
/// refilling tokens (spec §4.11).
pub struct SlidingWindow {
    max: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    pub fn new(max: usize, window: Duration) -> SlidingWindow {
        SlidingWindow {
            max,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    fn prune(queue: &mut VecDeque<Instant>, window: Duration, now: Instant) {
        while let Some(&front) = queue.front() {
            if now.duration_since(front) > window {
                queue.pop_front();
            } else {
                break;
            }
        }
    }

    pub async fn acquire_blocking(&self) {
        loop {
            let wait = {
                let mut queue = self.timestamps.lock().expect("sliding window mutex poisoned");
                let now = Instant::now();
                Self::prune(&mut queue, self.window, now);
                if queue.len() < self.max {
                    queue.push_back(now);
                    return;
                }
                let oldest = *queue.front().expect("queue full implies non-empty");
                (oldest + self.window).saturating_duration_since(now)
            };
            tokio::time::sleep(wait).await;
        }
    }

    pub fn try_acquire(&self) -> crate::Result<()> {
        let mut queue = self.timestamps.lock().expect("sliding window mutex poisoned");
        let now = Instant::now();
        Self::prune(&mut queue, self.window, now);
        if queue.len() < self.max {
            queue.push_back(now);
            Ok(())
        } else {
            let oldest = *queue.front().expect("queue full implies non-empty");
            let retry_after = (oldest + self.window).saturating_duration_since(now);
            Err(crate::Error::rate_limited(retry_after))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_acquire_succeeds_within_capacity() {
        let bucket = TokenBucket::new(5.0, 1.0);
        for _ in 0..5 {
            bucket.try_acquire(1.0).unwrap();
        }
        let err = bucket.try_acquire(1.0).unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn rate_limited_error_carries_retry_after() {
        let bucket = TokenBucket::new(1.0, 2.0);
        bucket.try_acquire(1.0).unwrap();
        let err = bucket.try_acquire(1.0).unwrap_err();
        assert!(err.retry_after().unwrap() > Duration::from_millis(0));
    }

    #[tokio::test]
    async fn acquire_blocking_waits_for_refill() {
        let bucket = TokenBucket::new(1.0, 1000.0);
        bucket.acquire_blocking(1.0).await;
        let start = Instant::now();
        bucket.acquire_blocking(1.0).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sliding_window_denies_over_limit() {
        let window = SlidingWindow::new(2, Duration::from_secs(60));
        window.try_acquire().unwrap();
        window.try_acquire().unwrap();
        assert!(window.try_acquire().is_err());
    }
}
