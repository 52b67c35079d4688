// src/config.rs

use std::env;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use validator::Validate;

use crate::error::AppError;
use crate::proctoring::devtools::{WindowMetrics, WindowSizeProbe};

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_FULLSCREEN_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_DEVTOOLS_POLL_INTERVAL_MS: u64 = 1_000;
/// Outer/inner window delta (px) above which a docked devtools panel is assumed.
pub const DEFAULT_DEVTOOLS_SIZE_THRESHOLD: u32 = 160;

#[derive(Debug, Clone, Validate)]
pub struct Config {
    #[validate(url(message = "API_URL must be a valid URL"))]
    pub api_url: String,

    #[validate(length(min = 1, message = "AUTH_TOKEN must not be empty"))]
    pub auth_token: String,

    pub rust_log: String,

    #[validate(length(min = 1))]
    pub log_dir: String,

    #[validate(range(min = 1, max = 60_000))]
    pub tick_interval_ms: u64,

    #[validate(range(max = 10_000))]
    pub fullscreen_retry_delay_ms: u64,

    #[validate(range(min = 10, max = 60_000))]
    pub devtools_poll_interval_ms: u64,

    #[validate(range(min = 1))]
    pub devtools_size_threshold: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let api_url = env::var("API_URL")
            .map_err(|_| AppError::Config("API_URL must be set".to_string()))?;

        let auth_token = env::var("AUTH_TOKEN")
            .map_err(|_| AppError::Config("AUTH_TOKEN must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let config = Self {
            api_url,
            auth_token,
            rust_log,
            log_dir,
            tick_interval_ms: parse_var("TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)?,
            fullscreen_retry_delay_ms: parse_var(
                "FULLSCREEN_RETRY_DELAY_MS",
                DEFAULT_FULLSCREEN_RETRY_DELAY_MS,
            )?,
            devtools_poll_interval_ms: parse_var(
                "DEVTOOLS_POLL_INTERVAL_MS",
                DEFAULT_DEVTOOLS_POLL_INTERVAL_MS,
            )?,
            devtools_size_threshold: parse_var(
                "DEVTOOLS_SIZE_THRESHOLD",
                DEFAULT_DEVTOOLS_SIZE_THRESHOLD,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Builds a config with default timings, for embedding hosts and tests.
    pub fn new(api_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            auth_token: auth_token.into(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            fullscreen_retry_delay_ms: DEFAULT_FULLSCREEN_RETRY_DELAY_MS,
            devtools_poll_interval_ms: DEFAULT_DEVTOOLS_POLL_INTERVAL_MS,
            devtools_size_threshold: DEFAULT_DEVTOOLS_SIZE_THRESHOLD,
        }
    }

    /// Window-geometry devtools probe using `DEVTOOLS_SIZE_THRESHOLD`.
    pub fn window_size_probe(&self, metrics: Arc<dyn WindowMetrics>) -> WindowSizeProbe {
        WindowSizeProbe::new(metrics, self.devtools_size_threshold)
    }

    pub fn timings(&self) -> Timings {
        Timings {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            fullscreen_retry_delay: Duration::from_millis(self.fullscreen_retry_delay_ms),
            devtools_poll_interval: Duration::from_millis(self.devtools_poll_interval_ms),
        }
    }
}

/// Timer periods shared by the controller and the proctoring monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub tick_interval: Duration,
    pub fullscreen_retry_delay: Duration,
    pub devtools_poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            fullscreen_retry_delay: Duration::from_millis(DEFAULT_FULLSCREEN_RETRY_DELAY_MS),
            devtools_poll_interval: Duration::from_millis(DEFAULT_DEVTOOLS_POLL_INTERVAL_MS),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}
