//! Error type definitions.
//!
//! This module defines the errors raised by the engine itself, the ready-made
//! `ApiError` for remote-call wrappers, and the failure taxonomy the retry
//! policy works from.

use std::fmt;
use std::time::Duration;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// A violated `ThrottleConfig` invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("requests_per_second must be a positive finite number (got {0})")]
    RequestsPerSecond(f64),

    #[error("requests_per_minute must be greater than 0")]
    RequestsPerMinute,

    #[error("burst_size must be greater than 0")]
    BurstSize,

    #[error("base_delay must be greater than 0")]
    BaseDelay,

    #[error("max_delay ({max_delay:?}) must not be less than base_delay ({base_delay:?})")]
    MaxDelay {
        max_delay: Duration,
        base_delay: Duration,
    },

    #[error("backoff_multiplier must be greater than 1 (got {0})")]
    BackoffMultiplier(f64),

    #[error("max_client_partitions must be greater than 0 when set")]
    MaxClientPartitions,
}

/// Result of an invocation that can also be cancelled.
///
/// `Failed` carries the operation's own error unchanged.
#[derive(Error, Debug)]
pub enum InvokeError<E> {
    #[error(transparent)]
    Failed(E),

    #[error("invocation cancelled")]
    Cancelled,
}

impl<E> InvokeError<E> {
    /// Returns the operation error, if this is not a cancellation.
    pub fn into_failed(self) -> Option<E> {
        match self {
            InvokeError::Failed(e) => Some(e),
            InvokeError::Cancelled => None,
        }
    }
}

/// Transport-level failure kinds reported by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The connection could not be established
    Connect,
    /// The request or response timed out
    Timeout,
    /// The connection broke while the request was in flight
    Network,
    /// Any other client-side failure (TLS setup, malformed request, ...)
    Other,
}

impl TransportErrorKind {
    /// Connect, timeout and network failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportErrorKind::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Network => "network",
            TransportErrorKind::Other => "transport",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by remote-call wrappers.
///
/// Wrappers map whatever their HTTP client reports into one of these
/// variants; the retry engine then decides from the variant alone.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// Raw `Retry-After` header value, if the remote sent one
        retry_after: Option<String>,
    },

    /// The request never produced a response.
    #[error("{kind} error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// Anything else (decode failures, wrapper bugs, ...).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    /// A 429 response, optionally with the server's `Retry-After` value.
    pub fn rate_limited(retry_after: Option<&str>) -> Self {
        ApiError::Status {
            status: crate::config::HTTP_STATUS_TOO_MANY_REQUESTS,
            message: "Too Many Requests".to_string(),
            retry_after: retry_after.map(str::to_string),
        }
    }

    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        ApiError::Transport {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return ApiError::Status {
                status: status.as_u16(),
                message: error.to_string(),
                retry_after: None,
            };
        }
        let kind = super::categorization::transport_kind_of(&error);
        ApiError::Transport {
            kind,
            message: error.to_string(),
        }
    }
}

/// How a failed attempt is treated by the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote rejected the call for exceeding its rate limit (429).
    RateLimited { retry_after: Option<String> },
    /// The remote failed internally (5xx).
    ServerError { status: u16 },
    /// Any other remote-signaled error (4xx other than 429).
    ClientError { status: u16 },
    /// The request never produced a response.
    Transport(TransportErrorKind),
    /// Not recognized; never retried.
    Unknown,
}

impl FailureKind {
    /// Maps an HTTP status code onto the failure taxonomy.
    pub fn from_status(status: u16, retry_after: Option<String>) -> Self {
        match status {
            crate::config::HTTP_STATUS_TOO_MANY_REQUESTS => {
                FailureKind::RateLimited { retry_after }
            }
            400..=499 => FailureKind::ClientError { status },
            500..=599 => FailureKind::ServerError { status },
            _ => FailureKind::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::RateLimited { .. } | FailureKind::ServerError { .. } => true,
            FailureKind::Transport(kind) => kind.is_retryable(),
            FailureKind::ClientError { .. } | FailureKind::Unknown => false,
        }
    }

    /// The server-suggested wait; only rate-limit signals carry one.
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            FailureKind::RateLimited { retry_after } => retry_after.as_deref(),
            _ => None,
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            FailureKind::RateLimited { .. } => FailureClass::RateLimited,
            FailureKind::ServerError { .. } => FailureClass::ServerError,
            FailureKind::ClientError { .. } => FailureClass::ClientError,
            FailureKind::Transport(_) => FailureClass::Transport,
            FailureKind::Unknown => FailureClass::Unknown,
        }
    }
}

/// Payload-free failure categories, used as statistics keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureClass {
    RateLimited,
    ServerError,
    ClientError,
    Transport,
    Unknown,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::RateLimited => "Too many requests (429)",
            FailureClass::ServerError => "Server error (5xx)",
            FailureClass::ClientError => "Client error (4xx)",
            FailureClass::Transport => "Transport error",
            FailureClass::Unknown => "Unknown error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_from_status_mapping() {
        assert_eq!(
            FailureKind::from_status(429, Some("3".to_string())),
            FailureKind::RateLimited {
                retry_after: Some("3".to_string())
            }
        );
        assert_eq!(
            FailureKind::from_status(503, None),
            FailureKind::ServerError { status: 503 }
        );
        assert_eq!(
            FailureKind::from_status(404, None),
            FailureKind::ClientError { status: 404 }
        );
        assert_eq!(FailureKind::from_status(302, None), FailureKind::Unknown);
    }

    #[test]
    fn test_from_status_drops_hint_for_non_429() {
        // Only rate-limit signals keep the Retry-After hint
        let kind = FailureKind::from_status(503, Some("10".to_string()));
        assert_eq!(kind.retry_after(), None);
    }

    #[test]
    fn test_retryable_split() {
        assert!(FailureKind::RateLimited { retry_after: None }.is_retryable());
        assert!(FailureKind::ServerError { status: 500 }.is_retryable());
        assert!(FailureKind::Transport(TransportErrorKind::Connect).is_retryable());
        assert!(FailureKind::Transport(TransportErrorKind::Timeout).is_retryable());
        assert!(FailureKind::Transport(TransportErrorKind::Network).is_retryable());

        assert!(!FailureKind::Transport(TransportErrorKind::Other).is_retryable());
        assert!(!FailureKind::ClientError { status: 400 }.is_retryable());
        assert!(!FailureKind::ClientError { status: 401 }.is_retryable());
        assert!(!FailureKind::Unknown.is_retryable());
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::status(400, "Bad request").to_string(),
            "HTTP 400: Bad request"
        );
        assert_eq!(
            ApiError::transport(TransportErrorKind::Timeout, "read timed out").to_string(),
            "timeout error: read timed out"
        );
        assert_eq!(
            ApiError::rate_limited(Some("5")).to_string(),
            "HTTP 429: Too Many Requests"
        );
    }

    #[test]
    fn test_invoke_error_is_transparent() {
        let err: InvokeError<ApiError> = InvokeError::Failed(ApiError::status(404, "missing"));
        assert_eq!(err.to_string(), "HTTP 404: missing");
        assert!(err.into_failed().is_some());

        let cancelled: InvokeError<ApiError> = InvokeError::Cancelled;
        assert_eq!(cancelled.to_string(), "invocation cancelled");
        assert!(cancelled.into_failed().is_none());
    }

    #[test]
    fn test_all_failure_classes_have_string_representation() {
        for class in FailureClass::iter() {
            assert!(!class.as_str().is_empty(), "{:?} should have a label", class);
        }
    }
}
