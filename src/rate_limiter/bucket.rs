//! Token bucket plus sliding window for one rate-limit partition.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Static limits shared by every partition of a limiter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub(crate) requests_per_second: f64,
    pub(crate) requests_per_minute: u32,
    pub(crate) burst_size: u32,
    pub(crate) window: Duration,
}

/// Rate-limit state of one partition (the shared one or a single client).
///
/// Not synchronized; the owning `RateLimiter` serializes access.
#[derive(Debug)]
pub(crate) struct Bucket {
    pub(crate) tokens: f64,
    pub(crate) last_refill: Instant,
    pub(crate) request_times: VecDeque<Instant>,
}

impl Bucket {
    pub(crate) fn new(burst_size: u32, now: Instant) -> Self {
        Bucket {
            tokens: f64::from(burst_size),
            last_refill: now,
            request_times: VecDeque::new(),
        }
    }

    /// Adds `elapsed * requests_per_second` tokens, capped at the burst size.
    pub(crate) fn refill(&mut self, now: Instant, limits: &Limits) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * limits.requests_per_second)
            .min(f64::from(limits.burst_size));
        self.last_refill = now;
    }

    /// Drops window entries older than the window length.
    pub(crate) fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(front) = self.request_times.front() {
            if now.saturating_duration_since(*front) > window {
                self.request_times.pop_front();
            } else {
                break;
            }
        }
    }

    /// Refills, prunes, then reports whether one more request fits.
    pub(crate) fn check(&mut self, now: Instant, limits: &Limits) -> bool {
        self.refill(now, limits);
        self.prune(now, limits.window);
        self.tokens >= 1.0 && self.request_times.len() < limits.requests_per_minute as usize
    }

    /// Spends one token and records the request. Does not check capacity.
    pub(crate) fn consume(&mut self, now: Instant) {
        self.tokens -= 1.0;
        self.request_times.push_back(now);
    }
}
