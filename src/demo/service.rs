//! A flaky in-process stand-in for a rate-limited remote API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error_handling::{ApiError, TransportErrorKind};

/// Fraction of calls that fail with each kind of error.
///
/// Each rate is in `[0, 1]` and their sum must not exceed 1; the remainder
/// of calls succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRates {
    /// 429 responses
    pub rate_limited: f64,
    /// 503 responses
    pub server_error: f64,
    /// Request timeouts
    pub timeout: f64,
    /// `Retry-After` value attached to 429 responses
    pub retry_after: Option<String>,
}

impl Default for FailureRates {
    fn default() -> Self {
        FailureRates {
            rate_limited: 0.1,
            server_error: 0.05,
            timeout: 0.05,
            retry_after: Some("1".to_string()),
        }
    }
}

impl FailureRates {
    /// No call ever fails.
    pub fn none() -> Self {
        FailureRates {
            rate_limited: 0.0,
            server_error: 0.0,
            timeout: 0.0,
            retry_after: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("rate_limited", self.rate_limited),
            ("server_error", self.server_error),
            ("timeout", self.timeout),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                bail!("{} failure rate must be between 0 and 1 (got {})", name, rate);
            }
        }
        let total = self.rate_limited + self.server_error + self.timeout;
        if total > 1.0 {
            bail!("failure rates add up to {:.2}, which exceeds 1", total);
        }
        Ok(())
    }
}

/// Simulated remote service answering after a fixed latency.
#[derive(Debug)]
pub struct SimulatedService {
    rates: FailureRates,
    latency: Duration,
    calls: AtomicUsize,
}

impl SimulatedService {
    pub fn new(rates: FailureRates, latency: Duration) -> Self {
        SimulatedService {
            rates,
            latency,
            calls: AtomicUsize::new(0),
        }
    }

    /// Handles one request, succeeding or failing at the configured rates.
    pub async fn call(&self, request_id: usize) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.respond(request_id)
    }

    /// Total requests received, retries included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, request_id: usize) -> Result<String, ApiError> {
        let roll: f64 = rand::rng().random();
        let rates = &self.rates;

        if roll < rates.rate_limited {
            return Err(ApiError::rate_limited(rates.retry_after.as_deref()));
        }
        let roll = roll - rates.rate_limited;
        if roll < rates.server_error {
            return Err(ApiError::status(503, "Service Unavailable"));
        }
        let roll = roll - rates.server_error;
        if roll < rates.timeout {
            return Err(ApiError::transport(
                TransportErrorKind::Timeout,
                format!("request {} timed out", request_id),
            ));
        }
        Ok(format!("response to request {}", request_id))
    }
}
