//! Retry policy: exponential backoff with jitter and `Retry-After` handling.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::{ThrottleConfig, JITTER_MAX_FRACTION, JITTER_MIN_FRACTION};
use crate::error_handling::ConfigError;

/// How many times to retry and how long to wait in between.
///
/// Built from a validated `ThrottleConfig`, so `base_delay > 0`,
/// `max_delay >= base_delay` and `backoff_multiplier > 1` always hold.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Creates a policy from the retry half of `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn from_config(config: &ThrottleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: &ThrottleConfig) -> Self {
        RetryPolicy {
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            max_delay: config.max_delay,
            backoff_multiplier: config.backoff_multiplier,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// `min(base_delay * multiplier^attempt, max_delay)`, without jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let uncapped =
            self.base_delay.as_secs_f64() * self.backoff_multiplier.powf(f64::from(attempt));
        let capped = uncapped.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Calculates the wait before retrying after failed attempt `attempt` (0-based).
    ///
    /// A usable server `retry_after` value wins outright, on any attempt.
    /// Otherwise the capped backoff delay plus 10-30% random jitter is used.
    pub fn calculate_retry_delay(&self, attempt: u32, retry_after: Option<&str>) -> Duration {
        if let Some(delay) = retry_after.and_then(parse_retry_after) {
            log::debug!("Using server-provided Retry-After of {:?}", delay);
            return delay;
        }

        let delay = self.backoff_delay(attempt);
        let jitter = rand::rng().random_range(JITTER_MIN_FRACTION..=JITTER_MAX_FRACTION);
        // Saturate instead of overflowing for delays near Duration::MAX
        Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter)).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_validated(&ThrottleConfig::default())
    }
}

/// Parses a `Retry-After` value: delay-seconds or an HTTP-date.
///
/// Returns `None` for anything unusable (negative, non-numeric, unknown date
/// format), in which case the caller falls back to computed backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    parse_retry_after_at(value, Utc::now())
}

fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Duration::try_from_secs_f64(seconds).ok();
        }
        return None;
    }

    // HTTP-date, e.g. "Wed, 21 Oct 2015 07:28:00 GMT"; a date in the past means "now"
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| (date.with_timezone(&Utc) - now).to_std().unwrap_or(Duration::ZERO))
}
