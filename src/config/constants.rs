//! Configuration constants.
//!
//! This module defines the defaults and fixed parameters used by the rate
//! limiter and the retry policy.

use std::time::Duration;

// Defaults for a generic rate-limited API
/// Default sustained request rate (tokens added per second)
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 1.0;
/// Default ceiling on requests in any trailing 60 second window
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;
/// Default token bucket capacity
pub const DEFAULT_BURST_SIZE: u32 = 10;
/// Default number of retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound on the computed backoff (before jitter)
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
/// Default factor applied to the delay on each further attempt
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

// Spotify preset
/// Spotify does not publish its limits; these stay well under the
/// ~100 requests/minute that most endpoints tolerate.
pub const SPOTIFY_REQUESTS_PER_SECOND: f64 = 0.5;
pub const SPOTIFY_REQUESTS_PER_MINUTE: u32 = 30;
pub const SPOTIFY_BURST_SIZE: u32 = 5;
pub const SPOTIFY_MAX_RETRIES: u32 = 5;

// Sliding window
/// Length of the trailing window used for the per-minute ceiling
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

// Slot polling
/// Upper bound on the sleep between admission checks in `wait_for_slot`
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Jitter
/// Jitter is drawn uniformly from `[JITTER_MIN_FRACTION, JITTER_MAX_FRACTION] * delay`
pub const JITTER_MIN_FRACTION: f64 = 0.1;
pub const JITTER_MAX_FRACTION: f64 = 0.3;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

// Demo driver
/// Seconds between progress lines while the demo runs
pub const LOGGING_INTERVAL: usize = 5;
