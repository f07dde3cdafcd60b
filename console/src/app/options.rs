//! Application configuration options

use std::time::Duration;

use crate::apps::model::PollCadence;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::workers::{poller, token_refresh};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Backend API base URL
    pub backend_base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Fast/slow application polling intervals
    pub polling: PollCadence,

    /// Enable application status poller
    pub enable_poller: bool,

    /// Enable silent token refresh
    pub enable_token_refresh: bool,

    /// Poller worker options
    pub poller: poller::Options,

    /// Token refresh worker options
    pub token_refresh_worker: token_refresh::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), StorageLayout::default())
    }
}

impl AppOptions {
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: settings.backend.base_url.clone(),
            request_timeout: settings.backend.request_timeout(),
            storage: StorageOptions {
                layout,
                files_stale_after: settings.files_stale_after(),
            },
            polling: settings.polling.cadence(),
            enable_poller: true,
            enable_token_refresh: true,
            poller: poller::Options {
                warmup_delay: settings.polling.warmup_delay(),
            },
            token_refresh_worker: token_refresh::Options {
                interval: settings.token_refresh_interval(),
            },
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,

    /// How long to wait for the background logout call on exit
    pub logout_grace: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
            logout_grace: Duration::from_secs(3),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,

    /// How long directory listings are served from cache
    pub files_stale_after: Duration,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            layout: StorageLayout::default(),
            files_stale_after: Duration::from_secs(300),
        }
    }
}
