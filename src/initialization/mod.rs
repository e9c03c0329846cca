//! Process-level setup for binaries embedding the engine.
//!
//! The library itself never installs a logger; it only emits through the
//! `log` facade. Binaries call `init_logger_with` once at startup.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
