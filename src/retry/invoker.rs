//! Retrying invoker: admission control plus failure recovery around a remote call.

use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::policy::RetryPolicy;
use crate::config::ThrottleConfig;
use crate::error_handling::{ClassifyFailure, ConfigError, InvocationStats, InvokeError};
use crate::rate_limiter::RateLimiter;

/// Derives a rate-limit partition key from an operation's arguments.
pub type ClientIdExtractor<A> = Arc<dyn Fn(&A) -> anyhow::Result<String> + Send + Sync>;

/// Runs remote calls through a `RateLimiter`, retrying transient failures.
///
/// Each attempt first acquires a slot from the limiter (waiting if needed and
/// spending a token whatever the outcome), then runs the operation. Failures
/// are classified through `ClassifyFailure`:
/// - rate-limit signals, server errors and connect/timeout/network failures
///   are retried after a backoff delay, up to `max_retries` times
/// - everything else is returned immediately
///
/// The caller always gets the operation's own error back, including when
/// retries run out.
///
/// `A` is the argument type seen by the optional client-id extractor; it is
/// `()` for invokers that only run argument-less operations.
pub struct RetryingInvoker<A = ()> {
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    client_id_extractor: Option<ClientIdExtractor<A>>,
    stats: Option<Arc<InvocationStats>>,
}

impl<A> Clone for RetryingInvoker<A> {
    fn clone(&self) -> Self {
        RetryingInvoker {
            limiter: Arc::clone(&self.limiter),
            policy: self.policy.clone(),
            client_id_extractor: self.client_id_extractor.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl RetryingInvoker<()> {
    /// Creates an invoker over a (possibly shared) limiter, using the retry
    /// policy the limiter was configured with.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        let policy = limiter.retry_policy().clone();
        RetryingInvoker {
            limiter,
            policy,
            client_id_extractor: None,
            stats: None,
        }
    }

    /// Creates an invoker with its own limiter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn from_config(config: &ThrottleConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(RateLimiter::new(config)?)))
    }
}

impl<A> RetryingInvoker<A> {
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Routes `execute_with_args` calls through per-client partitions.
    ///
    /// Extractor errors are ignored and the call uses the shared partition.
    pub fn with_client_id_extractor<B, F>(self, extractor: F) -> RetryingInvoker<B>
    where
        F: Fn(&B) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        RetryingInvoker {
            limiter: self.limiter,
            policy: self.policy,
            client_id_extractor: Some(Arc::new(extractor)),
            stats: self.stats,
        }
    }

    pub fn with_stats(mut self, stats: Arc<InvocationStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` against the shared partition.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: ClassifyFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(None, operation).await
    }

    /// Runs `operation` against the partition of `client_id`
    /// (`None` selects the shared partition).
    pub async fn execute_for<T, E, F, Fut>(
        &self,
        client_id: Option<&str>,
        operation: F,
    ) -> Result<T, E>
    where
        E: ClassifyFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(client_id, operation).await
    }

    /// Runs `operation(args)`, choosing the partition with the client-id
    /// extractor.
    pub async fn execute_with_args<T, E, F, Fut>(&self, args: &A, mut operation: F) -> Result<T, E>
    where
        E: ClassifyFailure,
        F: FnMut(&A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let client_id = self.extract_client_id(args);
        self.run(client_id.as_deref(), || operation(args)).await
    }

    /// Like `execute_for`, but gives up as soon as `token` is cancelled,
    /// whether waiting for a slot, running, or backing off.
    ///
    /// # Errors
    ///
    /// `InvokeError::Failed` carries the operation's error unchanged;
    /// `InvokeError::Cancelled` means the token fired first.
    pub async fn execute_until_cancelled<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        client_id: Option<&str>,
        operation: F,
    ) -> Result<T, InvokeError<E>>
    where
        E: ClassifyFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        tokio::select! {
            result = self.run(client_id, operation) => result.map_err(InvokeError::Failed),
            _ = token.cancelled() => {
                debug!("Invocation cancelled");
                Err(InvokeError::Cancelled)
            }
        }
    }

    fn extract_client_id(&self, args: &A) -> Option<String> {
        let extractor = self.client_id_extractor.as_ref()?;
        match extractor(args) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("Client id extraction failed, using shared partition: {:#}", e);
                None
            }
        }
    }

    fn record(&self, update: impl FnOnce(&InvocationStats)) {
        if let Some(stats) = &self.stats {
            update(stats);
        }
    }

    async fn run<T, E, F, Fut>(&self, client_id: Option<&str>, mut operation: F) -> Result<T, E>
    where
        E: ClassifyFailure,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire(client_id).await;
            self.record(InvocationStats::record_attempt);

            let error = match operation().await {
                Ok(value) => {
                    self.record(InvocationStats::record_success);
                    return Ok(value);
                }
                Err(error) => error,
            };

            let kind = error.failure_kind();
            self.record(|stats| stats.record_failure(kind.class()));

            if !kind.is_retryable() {
                debug!("Attempt {} failed with {}, not retrying", attempt + 1, kind.class());
                self.record(InvocationStats::record_fatal);
                return Err(error);
            }

            if attempt >= self.policy.max_retries() {
                warn!(
                    "Giving up after {} attempts, last failure: {}",
                    attempt + 1,
                    kind.class()
                );
                self.record(InvocationStats::record_exhausted);
                return Err(error);
            }

            let delay = self.policy.calculate_retry_delay(attempt, kind.retry_after());
            warn!(
                "Attempt {} failed with {}, retrying in {:.2}s",
                attempt + 1,
                kind.class(),
                delay.as_secs_f64()
            );
            self.record(InvocationStats::record_retry);
            sleep(delay).await;
            attempt += 1;
        }
    }
}
