//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

/// Logs how many invocations have finished and the overall throughput.
pub fn log_progress(
    start_time: Instant,
    completed_calls: &AtomicUsize,
    failed_calls: &AtomicUsize,
    total_calls: usize,
) {
    let completed = completed_calls.load(Ordering::SeqCst);
    let failed = failed_calls.load(Ordering::SeqCst);
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        (completed + failed) as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Finished {}/{} calls ({} failed) in {:.2} seconds (~{:.2} calls/sec)",
        completed + failed,
        total_calls,
        failed,
        elapsed_secs,
        rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_log_progress_handles_zero_elapsed() {
        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        // Must not divide by zero
        log_progress(Instant::now(), &completed, &failed, 0);
    }
}
