//! Configuration types.
//!
//! This module defines the throttling configuration and the logging enums
//! shared by the library and the demo binary.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Throttling and retry configuration.
///
/// One value configures both halves of the engine: the rate limiter reads
/// `requests_per_second`, `requests_per_minute`, `burst_size` and
/// `max_client_partitions`; the retry policy reads the rest.
///
/// # Examples
///
/// ```
/// use api_throttle::ThrottleConfig;
/// use std::time::Duration;
///
/// let config = ThrottleConfig {
///     requests_per_second: 2.0,
///     max_retries: 3,
///     base_delay: Duration::from_millis(100),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Tokens added to the bucket per second
    pub requests_per_second: f64,

    /// Maximum requests in any trailing 60 second window
    pub requests_per_minute: u32,

    /// Token bucket capacity (maximum burst)
    pub burst_size: u32,

    /// Retries after the initial attempt (0 disables retrying)
    pub max_retries: u32,

    /// Backoff delay for attempt 0
    pub base_delay: Duration,

    /// Cap on the computed backoff delay (jitter is added on top)
    pub max_delay: Duration,

    /// Growth factor of the backoff delay per attempt
    pub backoff_multiplier: f64,

    /// Bound on the number of per-client partitions kept by the limiter.
    /// `None` keeps every partition for the limiter's lifetime.
    pub max_client_partitions: Option<usize>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_size: DEFAULT_BURST_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_client_partitions: None,
        }
    }
}

impl ThrottleConfig {
    /// Conservative limits for the Spotify Web API.
    pub fn spotify() -> Self {
        Self {
            requests_per_second: SPOTIFY_REQUESTS_PER_SECOND,
            requests_per_minute: SPOTIFY_REQUESTS_PER_MINUTE,
            burst_size: SPOTIFY_BURST_SIZE,
            max_retries: SPOTIFY_MAX_RETRIES,
            ..Self::default()
        }
    }

    /// Checks every configuration invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            return Err(ConfigError::RequestsPerSecond(self.requests_per_second));
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::RequestsPerMinute);
        }
        if self.burst_size == 0 {
            return Err(ConfigError::BurstSize);
        }
        if self.base_delay.is_zero() {
            return Err(ConfigError::BaseDelay);
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::MaxDelay {
                max_delay: self.max_delay,
                base_delay: self.base_delay,
            });
        }
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier > 1.0) {
            return Err(ConfigError::BackoffMultiplier(self.backoff_multiplier));
        }
        if self.max_client_partitions == Some(0) {
            return Err(ConfigError::MaxClientPartitions);
        }
        Ok(())
    }
}
