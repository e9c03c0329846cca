//! Failure categorization.
//!
//! The retry engine never inspects error messages. Each error type that flows
//! through an invoker says what kind of failure it is by implementing
//! `ClassifyFailure`.

use super::types::{ApiError, FailureKind, TransportErrorKind};

/// Maps an operation error onto the retry taxonomy.
pub trait ClassifyFailure {
    fn failure_kind(&self) -> FailureKind;
}

impl ClassifyFailure for ApiError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            ApiError::Status {
                status,
                retry_after,
                ..
            } => FailureKind::from_status(*status, retry_after.clone()),
            ApiError::Transport { kind, .. } => FailureKind::Transport(*kind),
            ApiError::Other(_) => FailureKind::Unknown,
        }
    }
}

/// Categorizes a `reqwest::Error`.
///
/// Status codes take precedence; `reqwest::Error` does not expose response
/// headers, so a 429 seen this way never carries a `Retry-After` hint.
impl ClassifyFailure for reqwest::Error {
    fn failure_kind(&self) -> FailureKind {
        if let Some(status) = self.status() {
            return FailureKind::from_status(status.as_u16(), None);
        }
        FailureKind::Transport(transport_kind_of(self))
    }
}

/// Walks the cause chain and classifies the first error type it recognizes.
///
/// Context added with `anyhow::Context` does not hide the underlying
/// `ApiError` or `reqwest::Error`. Chains with neither are `Unknown`.
impl ClassifyFailure for anyhow::Error {
    fn failure_kind(&self) -> FailureKind {
        for cause in self.chain() {
            if let Some(api_err) = cause.downcast_ref::<ApiError>() {
                return api_err.failure_kind();
            }
            if let Some(reqwest_err) = cause.downcast_ref::<reqwest::Error>() {
                return reqwest_err.failure_kind();
            }
        }
        FailureKind::Unknown
    }
}

/// Determines the transport failure kind of a `reqwest::Error` that has no
/// HTTP status.
pub(crate) fn transport_kind_of(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_request() || error.is_body() {
        TransportErrorKind::Network
    } else {
        TransportErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_classify_api_error_status() {
        let err = ApiError::rate_limited(Some("7"));
        assert_eq!(
            err.failure_kind(),
            FailureKind::RateLimited {
                retry_after: Some("7".to_string())
            }
        );

        for status in [500, 502, 503, 504] {
            assert_eq!(
                ApiError::status(status, "server").failure_kind(),
                FailureKind::ServerError { status }
            );
        }

        assert_eq!(
            ApiError::status(401, "expired token").failure_kind(),
            FailureKind::ClientError { status: 401 }
        );
    }

    #[test]
    fn test_classify_api_error_transport() {
        let err = ApiError::transport(TransportErrorKind::Connect, "connection refused");
        assert_eq!(
            err.failure_kind(),
            FailureKind::Transport(TransportErrorKind::Connect)
        );
    }

    #[test]
    fn test_classify_api_error_other() {
        let err = ApiError::Other(anyhow::anyhow!("unexpected payload"));
        assert_eq!(err.failure_kind(), FailureKind::Unknown);
    }

    #[test]
    fn test_classify_anyhow_chain_with_context() {
        let err = anyhow::Error::from(ApiError::status(503, "Service Unavailable"))
            .context("Failed to fetch saved tracks")
            .context("Sync aborted");
        assert_eq!(err.failure_kind(), FailureKind::ServerError { status: 503 });
    }

    #[test]
    fn test_classify_anyhow_result_context() {
        let result: Result<(), ApiError> = Err(ApiError::rate_limited(None));
        let err = result.context("search failed").unwrap_err();
        assert_eq!(
            err.failure_kind(),
            FailureKind::RateLimited { retry_after: None }
        );
    }

    #[test]
    fn test_classify_anyhow_message_is_unknown() {
        // Messages that merely look transient are not trusted
        let err = anyhow::anyhow!("connection timeout on network");
        assert_eq!(err.failure_kind(), FailureKind::Unknown);
    }

    // Note: reqwest::Error cannot be constructed without a real request, so
    // its classification is exercised only through the status mapping above.
}
