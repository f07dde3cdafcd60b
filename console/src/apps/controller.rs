//! Application list queries and start/stop actions

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use tokio::sync::Notify;
use tracing::{debug, info};

use openapi_client::models::{DashboardResponse, StartAppResponse};

use crate::apps::model::{normalize_apps, App, PollCadence};
use crate::apps::store::AppsStore;
use crate::authn::session::SessionStore;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

/// Owns the application list and every request that touches it
pub struct AppsController {
    http_client: Arc<HttpClient>,
    session: Arc<SessionStore>,
    store: AppsStore,
    cadence: PollCadence,
    invalidated: Notify,
}

impl AppsController {
    pub fn new(
        http_client: Arc<HttpClient>,
        session: Arc<SessionStore>,
        cadence: PollCadence,
    ) -> Self {
        Self {
            http_client,
            session,
            store: AppsStore::new(),
            cadence,
            invalidated: Notify::new(),
        }
    }

    pub fn store(&self) -> &AppsStore {
        &self.store
    }

    pub fn apps(&self) -> Vec<App> {
        self.store.apps()
    }

    /// Interval until the next poll, based on the current records
    pub fn next_interval(&self) -> Duration {
        self.cadence.next_interval(&self.store.apps())
    }

    /// Fetch the full list and replace the local records with it
    pub async fn refresh(&self) -> Result<Vec<App>, ConsoleError> {
        let http_client = self.http_client.clone();
        let response = self
            .session
            .authorized(|token| async move { http_client.get_apps(token.expose_secret()).await })
            .await?;

        let apps = normalize_apps(response);
        let version = self.store.apply_fetch(apps.clone());
        debug!("Applied {} apps (version {})", apps.len(), version);
        Ok(apps)
    }

    /// Ask the backend to start `name`. On success the record is patched to
    /// `starting` right away and the list is invalidated.
    pub async fn start(&self, name: &str) -> Result<StartAppResponse, ConsoleError> {
        let http_client = self.http_client.clone();
        let response = self
            .session
            .authorized(|token| async move {
                http_client.start_app(token.expose_secret(), name).await
            })
            .await?;

        info!("Start requested for {}", name);
        if !self.store.mark_starting(name, &response) {
            debug!("{} not in the local list, skipping optimistic update", name);
        }
        self.invalidate();
        Ok(response)
    }

    /// Ask the backend to stop `name`. The record is left as is until the
    /// next fetch.
    pub async fn stop(&self, name: &str) -> Result<(), ConsoleError> {
        let http_client = self.http_client.clone();
        self.session
            .authorized(|token| async move {
                http_client.stop_app(token.expose_secret(), name).await
            })
            .await?;

        info!("Stop requested for {}", name);
        self.invalidate();
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<DashboardResponse, ConsoleError> {
        let http_client = self.http_client.clone();
        self.session
            .authorized(|token| async move {
                http_client.get_dashboard(token.expose_secret()).await
            })
            .await
    }

    /// Mark the list stale. A pending poller wakes up and re-fetches.
    pub fn invalidate(&self) {
        self.invalidated.notify_one();
    }

    /// Resolves once the list has been invalidated
    pub async fn invalidated(&self) {
        self.invalidated.notified().await;
    }

    /// Drop every record, e.g. after logout
    pub fn reset(&self) {
        self.store.clear();
    }
}
