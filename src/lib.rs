//! api_throttle library: client-side throttling for rate-limited HTTP APIs
//!
//! This library keeps calls to a remote API under its published limits and
//! recovers from the failures that slip through. It provides:
//! - `RateLimiter`: a token bucket plus a 60 second sliding window, kept per
//!   client identity or in one shared partition
//! - `RetryingInvoker`: runs an async operation through the limiter and
//!   retries rate-limit, server and transient transport failures with
//!   exponential backoff, jitter and `Retry-After` support
//!
//! # Example
//!
//! ```no_run
//! use api_throttle::{ApiError, RetryingInvoker, ThrottleConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let invoker = RetryingInvoker::from_config(&ThrottleConfig::spotify())?;
//!
//! let body = invoker
//!     .execute(|| async {
//!         let response = reqwest::get("https://api.spotify.com/v1/search?q=test")
//!             .await?
//!             .error_for_status()?;
//!         Ok::<_, ApiError>(response.text().await?)
//!     })
//!     .await?;
//! println!("{}", body);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
pub mod demo;
mod error_handling;
pub mod initialization;
mod rate_limiter;
mod retry;

// Re-export public API
pub use config::{DemoOptions, LogFormat, LogLevel, Preset, ThrottleConfig};
pub use demo::{run_demo, DemoConfig, DemoReport};
pub use error_handling::{
    ApiError, ClassifyFailure, ConfigError, FailureClass, FailureKind, InitializationError,
    InvocationStats, InvokeError, StatsSnapshot, TransportErrorKind,
};
pub use rate_limiter::RateLimiter;
pub use retry::{parse_retry_after, ClientIdExtractor, RetryPolicy, RetryingInvoker};
