use std::path::PathBuf;
use std::time::Duration;

use reelgen_core::limits::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_POLL_INTERVAL,
};
use reelgen_store::StoreConfig;
use reelgen_tracker::PollerConfig;

/// Default base URL of the generation service.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default directory for persisted sessions.
pub const DEFAULT_DATA_DIR: &str = ".reelgen";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub max_failures: u32,
    pub history_limit: usize,
    pub max_sessions: Option<usize>,
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `REELGEN_API_URL`          | `http://localhost:8000` |
    /// | `REELGEN_DATA_DIR`         | `.reelgen`              |
    /// | `REELGEN_POLL_INTERVAL_MS` | `3000`                  |
    /// | `REELGEN_MAX_FAILURES`     | `10`                    |
    /// | `REELGEN_HISTORY_LIMIT`    | `50`                    |
    /// | `REELGEN_MAX_SESSIONS`     | unset (no eviction)     |
    /// | `REELGEN_LOG_FORMAT`       | `text`                  |
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("REELGEN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let data_dir = var("REELGEN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let poll_interval = match var("REELGEN_POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms: u64 = parse(&raw, "REELGEN_POLL_INTERVAL_MS")?;
                if ms == 0 {
                    return Err("REELGEN_POLL_INTERVAL_MS must be greater than zero".into());
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let max_failures = match var("REELGEN_MAX_FAILURES") {
            Some(raw) => parse(&raw, "REELGEN_MAX_FAILURES")?,
            None => DEFAULT_MAX_CONSECUTIVE_FAILURES,
        };

        let history_limit = match var("REELGEN_HISTORY_LIMIT") {
            Some(raw) => parse(&raw, "REELGEN_HISTORY_LIMIT")?,
            None => DEFAULT_HISTORY_LIMIT,
        };
        if history_limit == 0 {
            return Err("REELGEN_HISTORY_LIMIT must be greater than zero".into());
        }

        let max_sessions = var("REELGEN_MAX_SESSIONS")
            .map(|raw| parse(&raw, "REELGEN_MAX_SESSIONS"))
            .transpose()?;

        let log_format = match var("REELGEN_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(format!(
                    "REELGEN_LOG_FORMAT must be `text` or `json`, got `{other}`"
                ))
            }
        };

        Ok(Self {
            api_url,
            data_dir,
            poll_interval,
            max_failures,
            history_limit,
            max_sessions,
            log_format,
        })
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval,
            max_consecutive_failures: self.max_failures,
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            history_limit: self.history_limit,
            max_sessions: self.max_sessions,
        }
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{key} must be a non-negative integer, got `{raw}`"))
}
