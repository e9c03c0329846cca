//! Throttling configuration and constants.
//!
//! This module provides:
//! - Default values and fixed parameters (window length, poll interval, jitter)
//! - `ThrottleConfig` with presets and validation
//! - Log level and format options
//! - `DemoOptions`, the demo binary's command line

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use cli::{DemoOptions, Preset};
pub use types::{LogFormat, LogLevel, ThrottleConfig};
