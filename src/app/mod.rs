//! Driver-side helpers for the demo run.
//!
//! Progress logging, shutdown of background tasks, and end-of-run statistics.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::shutdown_gracefully;
pub use statistics::print_final_statistics;
