//! End-of-run statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{FailureClass, InvocationStats};

/// Prints a one-line summary followed by the invocation statistics.
pub fn print_final_statistics(
    total_calls: usize,
    successful: usize,
    failed: usize,
    elapsed_seconds: f64,
    stats: &InvocationStats,
) {
    print_invocation_statistics(stats);
    info!(
        "✅ Ran {} call{} ({} succeeded, {} failed) in {:.1}s",
        total_calls,
        if total_calls == 1 { "" } else { "s" },
        successful,
        failed,
        elapsed_seconds
    );
}

/// Prints attempt, retry and per-class failure counts to the log.
pub fn print_invocation_statistics(stats: &InvocationStats) {
    info!(
        "Attempts: {} ({} retries, {} gave up after retrying, {} fatal)",
        stats.attempts(),
        stats.retries(),
        stats.exhausted(),
        stats.fatal()
    );

    let total_failures = stats.total_failures();
    if total_failures > 0 {
        info!("Failed attempts ({} total):", total_failures);
        for class in FailureClass::iter() {
            let count = stats.failure_count(class);
            if count > 0 {
                info!("   {}: {}", class.as_str(), count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_statistics_no_failures() {
        let stats = InvocationStats::new();
        stats.record_attempt();
        stats.record_success();
        print_invocation_statistics(&stats);
    }

    #[test]
    fn test_print_statistics_all_classes() {
        let stats = InvocationStats::new();
        for class in FailureClass::iter() {
            stats.record_attempt();
            stats.record_failure(class);
        }
        print_final_statistics(5, 0, 5, 1.5, &stats);
    }
}
