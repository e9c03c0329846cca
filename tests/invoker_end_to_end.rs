//! End-to-end behaviour of `RetryingInvoker` through the public API.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use api_throttle::{
    ApiError, ClassifyFailure, FailureClass, FailureKind, InvocationStats, RateLimiter,
    RetryPolicy, RetryingInvoker, ThrottleConfig, TransportErrorKind,
};
use tokio::time::Instant;

use helpers::{fast_config, ScriptedOperation};

#[tokio::test(start_paused = true)]
async fn rate_limited_then_success_takes_two_calls() {
    let invoker = RetryingInvoker::from_config(&fast_config(3)).unwrap();
    let op = ScriptedOperation::new(vec![ApiError::rate_limited(None)]);

    let result = invoker.execute(|| op.call()).await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(op.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn fatal_failure_is_returned_unchanged_after_one_call() {
    let invoker = RetryingInvoker::from_config(&fast_config(3)).unwrap();
    let op = ScriptedOperation::new(vec![ApiError::status(403, "Forbidden")]);

    let err = invoker.execute(|| op.call()).await.unwrap_err();

    assert_eq!(op.calls(), 1);
    assert_eq!(err.to_string(), "HTTP 403: Forbidden");
}

#[tokio::test(start_paused = true)]
async fn always_retryable_runs_max_retries_plus_one() {
    for max_retries in [0, 1, 4] {
        let invoker = RetryingInvoker::from_config(&fast_config(max_retries)).unwrap();
        let failures = (0..10)
            .map(|_| ApiError::transport(TransportErrorKind::Connect, "connection refused"))
            .collect();
        let op = ScriptedOperation::new(failures);

        let err = invoker.execute(|| op.call()).await.unwrap_err();

        assert_eq!(op.calls(), max_retries as usize + 1);
        assert_eq!(
            err.failure_kind(),
            FailureKind::Transport(TransportErrorKind::Connect)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn mixed_failures_each_take_their_own_path() {
    let stats = Arc::new(InvocationStats::new());
    let invoker = RetryingInvoker::from_config(&fast_config(5))
        .unwrap()
        .with_stats(Arc::clone(&stats));
    let op = ScriptedOperation::new(vec![
        ApiError::rate_limited(Some("1")),
        ApiError::status(500, "Internal Server Error"),
        ApiError::transport(TransportErrorKind::Network, "connection reset"),
    ]);

    let result = invoker.execute(|| op.call()).await;

    assert!(result.is_ok());
    assert_eq!(op.calls(), 4);
    assert_eq!(stats.retries(), 3);
    assert_eq!(stats.successes(), 1);
    assert_eq!(stats.failure_count(FailureClass::RateLimited), 1);
    assert_eq!(stats.failure_count(FailureClass::ServerError), 1);
    assert_eq!(stats.failure_count(FailureClass::Transport), 1);

    let snapshot = serde_json::to_value(stats.snapshot()).unwrap();
    assert_eq!(snapshot["attempts"], 4);
}

#[tokio::test(start_paused = true)]
async fn backoff_delays_grow_between_attempts() {
    let config = ThrottleConfig {
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(30),
        ..fast_config(3)
    };
    let invoker = RetryingInvoker::from_config(&config).unwrap();
    let op = ScriptedOperation::new(vec![
        ApiError::status(503, "unavailable"),
        ApiError::status(503, "unavailable"),
        ApiError::status(503, "unavailable"),
    ]);
    let start = Instant::now();

    invoker.execute(|| op.call()).await.unwrap();

    // 1s + 2s + 4s, each stretched by 10-30% jitter
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(7_700), "waited {:?}", waited);
    assert!(waited <= Duration::from_millis(9_200), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn http_date_retry_after_in_the_past_retries_immediately() {
    let invoker = RetryingInvoker::from_config(&fast_config(2)).unwrap();
    let op = ScriptedOperation::new(vec![ApiError::rate_limited(Some(
        "Wed, 21 Oct 2015 07:28:00 GMT",
    ))]);
    let start = Instant::now();

    invoker.execute(|| op.call()).await.unwrap();

    assert_eq!(op.calls(), 2);
    assert!(start.elapsed() < Duration::from_millis(10));
}

#[tokio::test(start_paused = true)]
async fn retry_policy_can_be_overridden_per_invoker() {
    let limiter = Arc::new(RateLimiter::new(&fast_config(5)).unwrap());
    let strict = RetryPolicy::from_config(&fast_config(0)).unwrap();
    let invoker = RetryingInvoker::new(Arc::clone(&limiter)).with_retry_policy(strict);
    let op = ScriptedOperation::new(vec![ApiError::status(502, "Bad Gateway")]);

    assert!(invoker.execute(|| op.call()).await.is_err());
    assert_eq!(op.calls(), 1);
    assert_eq!(limiter.retry_policy().max_retries(), 5);
}

#[tokio::test(start_paused = true)]
async fn anyhow_errors_are_classified_through_their_chain() {
    let invoker = RetryingInvoker::from_config(&fast_config(2)).unwrap();
    let op = ScriptedOperation::new(vec![ApiError::status(503, "unavailable")]);

    let result: anyhow::Result<&str> = invoker
        .execute(|| async {
            op.call()
                .await
                .map_err(|e| anyhow::Error::new(e).context("fetching playlist"))
        })
        .await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(op.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn invokers_sharing_a_limiter_share_its_quota() {
    let limiter = Arc::new(
        RateLimiter::new(&ThrottleConfig {
            requests_per_second: 1.0,
            burst_size: 2,
            ..fast_config(0)
        })
        .unwrap(),
    );
    let first = RetryingInvoker::new(Arc::clone(&limiter));
    let second = RetryingInvoker::new(Arc::clone(&limiter));
    let op = ScriptedOperation::new(vec![]);
    let start = Instant::now();

    first.execute(|| op.call()).await.unwrap();
    second.execute(|| op.call()).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));

    // The burst is spent; the third call waits for a refill
    first.execute(|| op.call()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(900));
    assert_eq!(limiter.requests_in_window(None).await, 3);
}
