//! Locally displayed application list

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use openapi_client::models::StartAppResponse;

use crate::apps::model::{App, AppStatus, Intent, RecordOrigin};

/// Point-in-time copy of the store
#[derive(Debug, Clone, Default)]
pub struct AppsSnapshot {
    pub apps: Vec<App>,
    /// Bumped on every write, authoritative or speculative
    pub version: u64,
    /// When the last authoritative fetch was applied
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Summary shown under the application list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppCounts {
    pub running: usize,
    pub stopped: usize,
    pub transitioning: usize,
    pub total: usize,
}

/// Application records with a single write path
#[derive(Debug, Default)]
pub struct AppsStore {
    inner: RwLock<AppsSnapshot>,
}

impl AppsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AppsSnapshot {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.clone()
    }

    pub fn apps(&self) -> Vec<App> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.apps.clone()
    }

    pub fn get(&self, id: &str) -> Option<App> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.apps.iter().find(|app| app.id == id).cloned()
    }

    /// Replace every record with a freshly fetched batch. Speculative
    /// records are overwritten whatever they contain.
    pub fn apply_fetch(&self, apps: Vec<App>) -> u64 {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.apps = apps;
        inner.version += 1;
        inner.fetched_at = Some(Utc::now());
        inner.version
    }

    /// Optimistically mark `id` as starting and merge any hints returned by
    /// the start call. Other records are untouched. Returns false when the
    /// id is not in the list.
    pub fn mark_starting(&self, id: &str, hints: &StartAppResponse) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let version = inner.version + 1;

        let Some(app) = inner.apps.iter_mut().find(|app| app.id == id) else {
            return false;
        };

        app.status = AppStatus::Starting;
        app.is_deployed = true;
        app.ready = false;
        if let Some(stages) = hints.stages {
            app.stages = Some(stages);
        }
        if let Some(message) = &hints.message {
            app.message = Some(message.clone());
        }
        if let Some(url) = &hints.novnc_url {
            app.novnc_url = Some(url.clone());
        }
        if let Some(pass) = &hints.vnc_pass {
            app.vnc_pass = Some(SecretString::from(pass.clone()));
        }
        app.origin = RecordOrigin::Speculative {
            intent: Intent::Start,
            version,
        };

        inner.version = version;
        true
    }

    pub fn counts(&self) -> AppCounts {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .apps
            .iter()
            .fold(AppCounts::default(), |mut counts, app| {
                match app.status {
                    AppStatus::Running => counts.running += 1,
                    AppStatus::Stopped => counts.stopped += 1,
                    AppStatus::Starting | AppStatus::Stopping => counts.transitioning += 1,
                    AppStatus::Error => {}
                }
                counts.total += 1;
                counts
            })
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *inner = AppsSnapshot::default();
    }
}
