//! Error handling and invocation statistics.
//!
//! This module provides:
//! - Error type definitions (`ApiError`, `ConfigError`, `InvokeError`, ...)
//! - The failure taxonomy and the `ClassifyFailure` trait
//! - Invocation statistics tracking
//!
//! Failures are categorized into:
//! - **Retryable**: rate-limit signals, server errors, connect/timeout/network failures
//! - **Fatal**: other client errors and anything unrecognized

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::ClassifyFailure;
pub use stats::{InvocationStats, StatsSnapshot};
pub use types::{
    ApiError, ConfigError, FailureClass, FailureKind, InitializationError, InvokeError,
    TransportErrorKind,
};
