//! Demo driver: many concurrent calls to a simulated flaky service.
//!
//! `run_demo` pushes `calls` invocations through one shared
//! `RetryingInvoker`, at most `concurrency` at a time, and reports how many
//! succeeded, how many attempts the service actually saw, and how long the
//! whole run took under the configured throttle.

mod service;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app::{log_progress, print_final_statistics, shutdown_gracefully};
use crate::config::{ThrottleConfig, LOGGING_INTERVAL};
use crate::error_handling::{InvocationStats, StatsSnapshot};
use crate::retry::RetryingInvoker;

pub use service::{FailureRates, SimulatedService};

/// Settings for one demo run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Number of logical calls to make
    pub calls: usize,
    /// Maximum calls in flight at once
    pub concurrency: usize,
    /// Number of distinct client ids to spread calls over (0 = shared partition only)
    pub clients: usize,
    /// Simulated service latency per attempt
    pub latency: Duration,
    pub failure_rates: FailureRates,
    pub throttle: ThrottleConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            calls: 20,
            concurrency: 4,
            clients: 0,
            latency: Duration::from_millis(50),
            failure_rates: FailureRates::default(),
            throttle: ThrottleConfig::default(),
        }
    }
}

/// Outcome of a demo run.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    /// Logical calls made
    pub total_calls: usize,
    /// Calls that eventually succeeded
    pub successful: usize,
    /// Calls that failed fatally or ran out of retries
    pub failed: usize,
    /// Requests the service received, retries included
    pub service_calls: usize,
    pub elapsed_seconds: f64,
    pub stats: StatsSnapshot,
}

/// One logical call; the client id picks the rate-limit partition.
#[derive(Debug, Clone)]
struct DemoCall {
    request_id: usize,
    client_id: Option<String>,
}

/// Runs the demo and returns its report.
///
/// # Errors
///
/// Returns an error if the throttle configuration or failure rates are
/// invalid, or `concurrency` is zero. Failed calls are counted in the
/// report, not returned as errors.
pub async fn run_demo(config: DemoConfig) -> Result<DemoReport> {
    if config.concurrency == 0 {
        bail!("concurrency must be greater than 0");
    }
    config.failure_rates.validate()?;

    let stats = Arc::new(InvocationStats::new());
    let invoker = RetryingInvoker::from_config(&config.throttle)
        .context("Invalid throttle configuration")?
        .with_stats(Arc::clone(&stats))
        .with_client_id_extractor(|call: &DemoCall| {
            call.client_id
                .clone()
                .context("call has no client id")
        });
    let service = Arc::new(SimulatedService::new(
        config.failure_rates.clone(),
        config.latency,
    ));

    info!(
        "Starting demo: {} calls, concurrency {}, {} rps / {} rpm, burst {}",
        config.calls,
        config.concurrency,
        config.throttle.requests_per_second,
        config.throttle.requests_per_minute,
        config.throttle.burst_size
    );

    let start_time = Instant::now();
    let completed_calls = Arc::new(AtomicUsize::new(0));
    let failed_calls = Arc::new(AtomicUsize::new(0));

    let cancel = CancellationToken::new();
    let cancel_logging = cancel.child_token();
    let completed_for_logging = Arc::clone(&completed_calls);
    let failed_for_logging = Arc::clone(&failed_calls);
    let total_calls = config.calls;
    let logging_task = Some(tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(LOGGING_INTERVAL as u64));
        // The first tick fires immediately
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    log_progress(start_time, &completed_for_logging, &failed_for_logging, total_calls);
                }
                _ = cancel_logging.cancelled() => {
                    break;
                }
            }
        }
    }));

    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut tasks = FuturesUnordered::new();

    for request_id in 0..config.calls {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Semaphore closed, skipping call {}", request_id);
                continue;
            }
        };

        let call = DemoCall {
            request_id,
            client_id: (config.clients > 0)
                .then(|| format!("client-{}", request_id % config.clients)),
        };
        let invoker = invoker.clone();
        let service = Arc::clone(&service);
        let completed_calls = Arc::clone(&completed_calls);
        let failed_calls = Arc::clone(&failed_calls);

        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let call_start = Instant::now();

            let result = invoker
                .execute_with_args(&call, |call| service.call(call.request_id))
                .await;

            match result {
                Ok(body) => {
                    completed_calls.fetch_add(1, Ordering::SeqCst);
                    log::debug!(
                        "Call {} succeeded in {:.2}s: {}",
                        call.request_id,
                        call_start.elapsed().as_secs_f64(),
                        body
                    );
                }
                Err(e) => {
                    failed_calls.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        "Call {} failed after {:.2}s: {}",
                        call.request_id,
                        call_start.elapsed().as_secs_f64(),
                        e
                    );
                }
            }
        }));
    }

    while let Some(task_result) = tasks.next().await {
        if let Err(join_error) = task_result {
            failed_calls.fetch_add(1, Ordering::SeqCst);
            warn!("Task panicked: {:?}", join_error);
        }
    }

    shutdown_gracefully(cancel, logging_task).await;

    let elapsed_seconds = start_time.elapsed().as_secs_f64();
    let successful = completed_calls.load(Ordering::SeqCst);
    let failed = failed_calls.load(Ordering::SeqCst);
    print_final_statistics(config.calls, successful, failed, elapsed_seconds, &stats);

    Ok(DemoReport {
        total_calls: config.calls,
        successful,
        failed,
        service_calls: service.calls(),
        elapsed_seconds,
        stats: stats.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_throttle() -> ThrottleConfig {
        ThrottleConfig {
            requests_per_second: 100.0,
            requests_per_minute: 1000,
            burst_size: 10,
            max_retries: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_with_healthy_service() {
        let report = run_demo(DemoConfig {
            calls: 25,
            concurrency: 5,
            failure_rates: FailureRates::none(),
            throttle: fast_throttle(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(report.total_calls, 25);
        assert_eq!(report.successful, 25);
        assert_eq!(report.failed, 0);
        assert_eq!(report.service_calls, 25);
        assert_eq!(report.stats.attempts, 25);
        assert_eq!(report.stats.retries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_with_always_failing_service() {
        let report = run_demo(DemoConfig {
            calls: 4,
            concurrency: 2,
            clients: 2,
            failure_rates: FailureRates {
                server_error: 1.0,
                ..FailureRates::none()
            },
            throttle: fast_throttle(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 4);
        // Initial attempt plus two retries per call
        assert_eq!(report.service_calls, 12);
        assert_eq!(report.stats.exhausted, 4);
    }

    #[tokio::test]
    async fn test_demo_rejects_invalid_settings() {
        let zero_concurrency = DemoConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(run_demo(zero_concurrency).await.is_err());

        let bad_throttle = DemoConfig {
            throttle: ThrottleConfig {
                burst_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(run_demo(bad_throttle).await.is_err());
    }
}
