//! Rate limiter implementation.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use super::bucket::{Bucket, Limits};
use crate::config::{ThrottleConfig, MAX_POLL_INTERVAL, RATE_WINDOW};
use crate::error_handling::ConfigError;
use crate::retry::RetryPolicy;

/// Admission control for calls to a rate-limited API.
///
/// Every partition enforces two limits at once:
/// - a token bucket refilled continuously at `requests_per_second`, holding
///   at most `burst_size` tokens
/// - at most `requests_per_minute` requests in any trailing 60 seconds
///
/// Calls made without a client id share one partition. Each distinct client
/// id gets its own partition, created on first use, so one client exhausting
/// its quota never blocks another.
///
/// Refill happens when a partition is checked; there is no background task.
/// Share one instance between tasks with `Arc`.
pub struct RateLimiter {
    limits: Limits,
    max_client_partitions: Option<usize>,
    retry_policy: RetryPolicy,
    state: Mutex<Partitions>,
}

struct Partitions {
    shared: Bucket,
    clients: HashMap<String, Bucket>,
}

impl Partitions {
    fn bucket_mut(
        &mut self,
        client_id: Option<&str>,
        now: Instant,
        limits: &Limits,
        max_client_partitions: Option<usize>,
    ) -> &mut Bucket {
        // An empty id carries no identity and shares the common partition
        let Some(id) = client_id.filter(|id| !id.is_empty()) else {
            return &mut self.shared;
        };
        if !self.clients.contains_key(id) {
            if let Some(max) = max_client_partitions {
                self.evict_least_recently_used(max);
            }
            log::debug!("Creating rate limit partition for client {}", id);
        }
        self.clients
            .entry(id.to_string())
            .or_insert_with(|| Bucket::new(limits.burst_size, now))
    }

    /// Makes room for one more partition when `max` are already held.
    fn evict_least_recently_used(&mut self, max: usize) {
        while self.clients.len() >= max {
            let Some(oldest) = self
                .clients
                .iter()
                .min_by_key(|(_, bucket)| bucket.last_refill)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            log::debug!("Evicting idle rate limit partition for client {}", oldest);
            self.clients.remove(&oldest);
        }
    }
}

impl RateLimiter {
    /// Creates a rate limiter from `config`.
    ///
    /// The retry half of the configuration is kept as well, so
    /// `calculate_retry_delay` works on the limiter directly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(config: &ThrottleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limits = Limits {
            requests_per_second: config.requests_per_second,
            requests_per_minute: config.requests_per_minute,
            burst_size: config.burst_size,
            window: RATE_WINDOW,
        };
        Ok(RateLimiter {
            limits,
            max_client_partitions: config.max_client_partitions,
            retry_policy: RetryPolicy::from_validated(config),
            state: Mutex::new(Partitions {
                shared: Bucket::new(limits.burst_size, Instant::now()),
                clients: HashMap::new(),
            }),
        })
    }

    /// Returns whether a request may be made right now.
    ///
    /// Refills tokens and prunes the window as a side effect, but does not
    /// consume anything.
    pub async fn can_make_request(&self, client_id: Option<&str>) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state
            .bucket_mut(client_id, now, &self.limits, self.max_client_partitions)
            .check(now, &self.limits)
    }

    /// Spends one token and records the request in the window.
    ///
    /// Does not check capacity; call `can_make_request` or `wait_for_slot`
    /// first, or use `acquire` which does both atomically.
    pub async fn consume_token(&self, client_id: Option<&str>) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state
            .bucket_mut(client_id, now, &self.limits, self.max_client_partitions)
            .consume(now);
    }

    /// Waits until `can_make_request` returns true. No timeout.
    ///
    /// Another task may take the slot between this returning and a following
    /// `consume_token`; `acquire` avoids that.
    pub async fn wait_for_slot(&self, client_id: Option<&str>) {
        while !self.can_make_request(client_id).await {
            sleep(self.poll_interval()).await;
        }
    }

    /// Waits for a slot and consumes it under the same lock acquisition.
    pub async fn acquire(&self, client_id: Option<&str>) {
        let mut waited = false;
        loop {
            {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let bucket =
                    state.bucket_mut(client_id, now, &self.limits, self.max_client_partitions);
                if bucket.check(now, &self.limits) {
                    bucket.consume(now);
                    return;
                }
            }
            if !waited {
                log::debug!(
                    "Rate limit reached for {}, waiting for a slot",
                    client_id.unwrap_or("shared partition")
                );
                waited = true;
            }
            sleep(self.poll_interval()).await;
        }
    }

    /// Delay before retrying after failed attempt `attempt`.
    ///
    /// See `RetryPolicy::calculate_retry_delay`.
    pub fn calculate_retry_delay(&self, attempt: u32, retry_after: Option<&str>) -> Duration {
        self.retry_policy.calculate_retry_delay(attempt, retry_after)
    }

    /// The retry policy built from this limiter's configuration.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Sleep between admission checks: `min(1 / requests_per_second, 100ms)`.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.limits.requests_per_second)
            .unwrap_or(MAX_POLL_INTERVAL)
            .min(MAX_POLL_INTERVAL)
    }

    /// Current token count of a partition, after refilling.
    pub async fn available_tokens(&self, client_id: Option<&str>) -> f64 {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let bucket = state.bucket_mut(client_id, now, &self.limits, self.max_client_partitions);
        bucket.refill(now, &self.limits);
        bucket.tokens
    }

    /// Number of requests in a partition's trailing window, after pruning.
    pub async fn requests_in_window(&self, client_id: Option<&str>) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let bucket = state.bucket_mut(client_id, now, &self.limits, self.max_client_partitions);
        bucket.prune(now, self.limits.window);
        bucket.request_times.len()
    }

    /// Number of per-client partitions currently held.
    pub async fn partition_count(&self) -> usize {
        self.state.lock().await.clients.len()
    }
}
