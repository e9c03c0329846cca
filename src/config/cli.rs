//! Command-line options for the `throttle_demo` binary.
//!
//! Every option can also be set through a `THROTTLE_*` environment variable;
//! an explicit flag wins over the environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::types::{LogFormat, LogLevel, ThrottleConfig};
use crate::demo::{DemoConfig, FailureRates};

/// Starting point for the throttle settings; individual flags override it.
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Generic defaults: 1 rps, 60 rpm, burst 10
    Default,
    /// Spotify Web API limits: 0.5 rps, 30 rpm, burst 5
    Spotify,
}

/// Drive a simulated flaky API through the throttling engine.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "throttle_demo",
    about = "Drive a simulated rate-limited API through the throttling and retry engine."
)]
pub struct DemoOptions {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, env = "THROTTLE_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, env = "THROTTLE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Throttle preset to start from
    #[arg(long, value_enum, default_value_t = Preset::Default, env = "THROTTLE_PRESET")]
    pub preset: Preset,

    /// Token refill rate
    #[arg(long, env = "THROTTLE_REQUESTS_PER_SECOND")]
    pub requests_per_second: Option<f64>,

    /// Sliding 60 second window ceiling
    #[arg(long, env = "THROTTLE_REQUESTS_PER_MINUTE")]
    pub requests_per_minute: Option<u32>,

    /// Token bucket capacity
    #[arg(long, env = "THROTTLE_BURST_SIZE")]
    pub burst_size: Option<u32>,

    /// Retries after the initial attempt
    #[arg(long, env = "THROTTLE_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// First backoff delay in milliseconds
    #[arg(long, env = "THROTTLE_BASE_DELAY_MS")]
    pub base_delay_ms: Option<u64>,

    /// Backoff cap in milliseconds
    #[arg(long, env = "THROTTLE_MAX_DELAY_MS")]
    pub max_delay_ms: Option<u64>,

    /// Backoff growth factor per attempt
    #[arg(long, env = "THROTTLE_BACKOFF_MULTIPLIER")]
    pub backoff_multiplier: Option<f64>,

    /// Maximum number of per-client partitions kept (least recently used are evicted)
    #[arg(long, env = "THROTTLE_MAX_CLIENT_PARTITIONS")]
    pub max_client_partitions: Option<usize>,

    /// Number of calls to make
    #[arg(long, default_value_t = 20, env = "THROTTLE_CALLS")]
    pub calls: usize,

    /// Maximum concurrent calls
    #[arg(long, default_value_t = 4, env = "THROTTLE_CONCURRENCY")]
    pub concurrency: usize,

    /// Distinct client ids to spread calls over (0 uses the shared partition)
    #[arg(long, default_value_t = 0, env = "THROTTLE_CLIENTS")]
    pub clients: usize,

    /// Simulated latency per attempt in milliseconds
    #[arg(long, default_value_t = 50, env = "THROTTLE_LATENCY_MS")]
    pub latency_ms: u64,

    /// Fraction of attempts answered with 429
    #[arg(long, default_value_t = 0.1, env = "THROTTLE_RATE_LIMITED_RATE")]
    pub rate_limited_rate: f64,

    /// Fraction of attempts answered with 503
    #[arg(long, default_value_t = 0.05, env = "THROTTLE_SERVER_ERROR_RATE")]
    pub server_error_rate: f64,

    /// Fraction of attempts that time out
    #[arg(long, default_value_t = 0.05, env = "THROTTLE_TIMEOUT_RATE")]
    pub timeout_rate: f64,

    /// Retry-After value sent with simulated 429s (seconds or HTTP-date)
    #[arg(long, env = "THROTTLE_RETRY_AFTER")]
    pub retry_after: Option<String>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl DemoOptions {
    /// The preset with any explicit overrides applied. Not validated.
    pub fn throttle_config(&self) -> ThrottleConfig {
        let mut config = match self.preset {
            Preset::Default => ThrottleConfig::default(),
            Preset::Spotify => ThrottleConfig::spotify(),
        };
        if let Some(rps) = self.requests_per_second {
            config.requests_per_second = rps;
        }
        if let Some(rpm) = self.requests_per_minute {
            config.requests_per_minute = rpm;
        }
        if let Some(burst) = self.burst_size {
            config.burst_size = burst;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(ms) = self.base_delay_ms {
            config.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            config.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = self.backoff_multiplier {
            config.backoff_multiplier = multiplier;
        }
        if self.max_client_partitions.is_some() {
            config.max_client_partitions = self.max_client_partitions;
        }
        config
    }

    pub fn demo_config(&self) -> DemoConfig {
        DemoConfig {
            calls: self.calls,
            concurrency: self.concurrency,
            clients: self.clients,
            latency: Duration::from_millis(self.latency_ms),
            failure_rates: FailureRates {
                rate_limited: self.rate_limited_rate,
                server_error: self.server_error_rate,
                timeout: self.timeout_rate,
                retry_after: self.retry_after.clone(),
            },
            throttle: self.throttle_config(),
        }
    }
}
