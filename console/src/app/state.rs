//! Application state management

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::activity::log::ActivityLog;
use crate::app::options::AppOptions;
use crate::apps::controller::AppsController;
use crate::apps::model::PollCadence;
use crate::authn::session::{SessionStore, SessionStoreExt};
use crate::cache::files::FilesCache;
use crate::errors::ConsoleError;
use crate::files::browser::FileBrowser;
use crate::http::client::HttpClient;
use crate::storage::kv::{FileKvStore, KeyValueStore};

/// Main application state. Everything the console does hangs off this.
pub struct AppState {
    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,

    /// Current session and its persistence
    pub session: Arc<SessionStore>,

    /// Application list and start/stop actions
    pub apps: Arc<AppsController>,

    /// Personal file store
    pub files: Arc<FileBrowser>,

    /// Admin audit log
    pub activity: Arc<ActivityLog>,
}

impl AppState {
    /// Build the state from `options` and restore the persisted session
    pub async fn init(options: &AppOptions) -> Result<Self, ConsoleError> {
        info!("Initializing application state...");

        options.storage.layout.setup().await?;

        let http_client = Arc::new(HttpClient::new(
            &options.backend_base_url,
            options.request_timeout,
        )?);
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(FileKvStore::new(Arc::new(options.storage.layout.session_file())));

        let state = Self::with_storage(
            http_client,
            storage,
            options.polling,
            options.storage.files_stale_after,
        );
        state.session.load().await?;
        Ok(state)
    }

    /// Wire the components around an existing client and session storage
    pub fn with_storage(
        http_client: Arc<HttpClient>,
        storage: Arc<dyn KeyValueStore>,
        cadence: PollCadence,
        files_stale_after: Duration,
    ) -> Self {
        let session = Arc::new(SessionStore::new(http_client.clone(), storage));
        let apps = Arc::new(AppsController::new(
            http_client.clone(),
            session.clone(),
            cadence,
        ));
        let files = Arc::new(FileBrowser::new(
            http_client.clone(),
            session.clone(),
            FilesCache::new(files_stale_after),
        ));
        let activity = Arc::new(ActivityLog::new(http_client.clone(), session.clone()));

        Self {
            http_client,
            session,
            apps,
            files,
            activity,
        }
    }

    /// Sign out and drop every cached record. Waits at most `grace` for the
    /// backend to acknowledge.
    pub async fn logout(&self, grace: Duration) {
        let invalidation = self.session.logout().await;
        self.apps.reset();
        self.files.cache().clear();

        if tokio::time::timeout(grace, invalidation).await.is_err() {
            warn!("Backend logout still pending after {:?}, not waiting", grace);
        }
    }

    /// Persist the session
    pub async fn shutdown(&self) -> Result<(), ConsoleError> {
        info!("Shutting down application state...");
        if !self.session.is_authenticated() {
            self.apps.reset();
            self.files.cache().clear();
        }
        self.session.save().await
    }
}
