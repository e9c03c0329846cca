// Shared test helpers for building throttle configurations and scripted operations.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use api_throttle::{ApiError, ThrottleConfig};

/// A configuration loose enough that admission never waits, with short backoff.
#[allow(dead_code)] // Used by other test files
pub fn fast_config(max_retries: u32) -> ThrottleConfig {
    ThrottleConfig {
        requests_per_second: 1000.0,
        requests_per_minute: 10_000,
        burst_size: 100,
        max_retries,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(200),
        ..Default::default()
    }
}

/// An operation that replays a fixed script of outcomes, then succeeds forever.
pub struct ScriptedOperation {
    script: Mutex<VecDeque<ApiError>>,
    calls: AtomicUsize,
}

#[allow(dead_code)] // Used by other test files
impl ScriptedOperation {
    pub fn new(failures: Vec<ApiError>) -> Self {
        ScriptedOperation {
            script: Mutex::new(failures.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn call(&self) -> Result<&'static str, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().expect("script lock poisoned").pop_front();
        match next {
            Some(error) => Err(error),
            None => Ok("success"),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
