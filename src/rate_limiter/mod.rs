//! Client-side rate limiting.
//!
//! A `RateLimiter` combines two limits for each partition:
//! - a token bucket that refills at `requests_per_second`, holding at most
//!   `burst_size` tokens
//! - a 60 second sliding window allowing at most `requests_per_minute` requests
//!
//! Calls without a client id use one shared partition; each distinct client id
//! gets its own, created on first use.

mod bucket;
mod limiter;

pub use limiter::RateLimiter;
