//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::apps::model::PollCadence;
use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Environment variable overriding `backend.base_url`
pub const API_URL_ENV: &str = "EASYTP_API_URL";

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Also write logs into the layout's `logs/` directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Application polling configuration
    #[serde(default)]
    pub polling: PollingSettings,

    /// Silent token refresh interval in seconds
    #[serde(default = "default_token_refresh_interval")]
    pub token_refresh_interval_secs: u64,

    /// How long a directory listing is served from cache, in seconds
    #[serde(default = "default_files_stale")]
    pub files_stale_secs: u64,
}

fn default_token_refresh_interval() -> u64 {
    50 * 60
}

fn default_files_stale() -> u64 {
    5 * 60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_to_file: false,
            backend: BackendSettings::default(),
            polling: PollingSettings::default(),
            token_refresh_interval_secs: default_token_refresh_interval(),
            files_stale_secs: default_files_stale(),
        }
    }
}

impl Settings {
    /// Read settings from `file`, falling back to defaults when the file is
    /// absent, then apply environment overrides.
    pub async fn load(file: &File) -> Result<Self, ConsoleError> {
        let mut settings = match file.read_json_opt::<Settings>().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No settings at {}, using defaults", file.path().display());
                Settings::default()
            }
            Err(e) => {
                return Err(ConsoleError::ConfigError(format!(
                    "Unable to read {}: {}",
                    file.path().display(),
                    e
                )))
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        match lookup(API_URL_ENV) {
            Some(url) if !url.trim().is_empty() => self.backend.base_url = url,
            _ => warn_default_url(&self.backend.base_url),
        }
    }

    pub fn token_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.token_refresh_interval_secs)
    }

    pub fn files_stale_after(&self) -> Duration {
        Duration::from_secs(self.files_stale_secs)
    }
}

fn warn_default_url(current: &str) {
    if current == default_backend_url() {
        warn!("{} not set, using default: {}", API_URL_ENV, current);
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Polling cadence and warm-up delay, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_fast_interval")]
    pub fast_interval_ms: u64,

    #[serde(default = "default_slow_interval")]
    pub slow_interval_ms: u64,

    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_ms: u64,
}

fn default_fast_interval() -> u64 {
    400
}

fn default_slow_interval() -> u64 {
    15_000
}

fn default_warmup_delay() -> u64 {
    1_500
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            fast_interval_ms: default_fast_interval(),
            slow_interval_ms: default_slow_interval(),
            warmup_delay_ms: default_warmup_delay(),
        }
    }
}

impl PollingSettings {
    pub fn cadence(&self) -> PollCadence {
        PollCadence {
            fast: Duration::from_millis(self.fast_interval_ms),
            slow: Duration::from_millis(self.slow_interval_ms),
        }
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }
}
