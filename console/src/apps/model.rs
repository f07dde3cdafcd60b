//! Canonical application records and the adapter from backend shapes

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use openapi_client::models::{AppsResponse, DeploymentStages, RawApp};

/// Normalized application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Running,
    Stopped,
    Starting,
    Stopping,
    Error,
}

impl AppStatus {
    /// Parse a granular backend status. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => Some(AppStatus::Running),
            "stopped" => Some(AppStatus::Stopped),
            "starting" => Some(AppStatus::Starting),
            "stopping" => Some(AppStatus::Stopping),
            "error" | "failed" => Some(AppStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Running => "running",
            AppStatus::Stopped => "stopped",
            AppStatus::Starting => "starting",
            AppStatus::Stopping => "stopping",
            AppStatus::Error => "error",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User intent behind a speculative record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
}

/// Where the current value of a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Straight from the last fetch
    Authoritative,
    /// Locally patched after a user action, pending the next fetch
    Speculative { intent: Intent, version: u64 },
}

/// An application as the rest of the crate sees it
#[derive(Debug, Clone)]
pub struct App {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: AppStatus,
    pub is_deployed: bool,
    pub ready: bool,
    pub stages: Option<DeploymentStages>,
    pub message: Option<String>,
    pub novnc_url: Option<String>,
    pub vnc_pass: Option<SecretString>,
    pub origin: RecordOrigin,
}

impl App {
    /// Connection details, present only for running apps that carry both a
    /// noVNC URL and a password.
    pub fn connection(&self) -> Option<VncConnection> {
        if self.status != AppStatus::Running {
            return None;
        }
        match (&self.novnc_url, &self.vnc_pass) {
            (Some(url), Some(password)) if !url.is_empty() => Some(VncConnection {
                novnc_url: url.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_speculative(&self) -> bool {
        matches!(self.origin, RecordOrigin::Speculative { .. })
    }
}

/// noVNC endpoint of a running application
#[derive(Debug, Clone)]
pub struct VncConnection {
    pub novnc_url: String,
    pub password: SecretString,
}

impl VncConnection {
    /// Link that opens the desktop with the password pre-filled
    pub fn direct_url(&self) -> String {
        let password: String =
            url::form_urlencoded::byte_serialize(self.password.expose_secret().as_bytes()).collect();
        format!(
            "{}/vnc.html?password={}&path=vnc&autoconnect=true&resize=remote&reconnect=true&show_dot=true",
            self.novnc_url.trim_end_matches('/'),
            password
        )
    }
}

/// Turn one backend record into an [`App`].
///
/// A recognised granular `status` wins; otherwise the status is inferred from
/// `deployment_status`. Absent `is_deployed` and `ready` are inferred from the
/// resulting status so legacy backends never look mid-transition.
pub fn normalize_app(name: &str, raw: RawApp) -> App {
    let status = raw
        .status
        .as_deref()
        .and_then(AppStatus::parse)
        .unwrap_or(match raw.deployment_status {
            Some(true) => AppStatus::Running,
            _ => AppStatus::Stopped,
        });

    let is_deployed = raw
        .is_deployed
        .or(raw.deployment_status)
        .unwrap_or(status == AppStatus::Running);
    let ready = raw.ready.unwrap_or(status == AppStatus::Running);

    App {
        id: name.to_string(),
        name: name.to_string(),
        description: raw.description,
        status,
        is_deployed,
        ready,
        stages: raw.stages,
        message: raw.message,
        novnc_url: raw.novnc_url,
        vnc_pass: raw.vnc_pass.map(SecretString::from),
        origin: RecordOrigin::Authoritative,
    }
}

/// Normalize a whole `/apps/` response. Order follows the backend mapping's
/// iteration order and is not stable between fetches.
pub fn normalize_apps(response: AppsResponse) -> Vec<App> {
    response
        .apps
        .into_iter()
        .map(|(name, raw)| normalize_app(&name, raw))
        .collect()
}

/// Whether an application is mid-change and worth polling aggressively
pub fn is_transitional(app: &App) -> bool {
    matches!(app.status, AppStatus::Starting | AppStatus::Stopping)
        || (app.status != AppStatus::Stopped && app.is_deployed && !app.ready)
}

pub fn batch_is_transitional(apps: &[App]) -> bool {
    apps.iter().any(is_transitional)
}

/// Fast/slow polling intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    pub fast: Duration,
    pub slow: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            fast: Duration::from_millis(400),
            slow: Duration::from_millis(15_000),
        }
    }
}

impl PollCadence {
    /// Interval until the next fetch, given the batch just fetched
    pub fn next_interval(&self, apps: &[App]) -> Duration {
        if batch_is_transitional(apps) {
            self.fast
        } else {
            self.slow
        }
    }
}
