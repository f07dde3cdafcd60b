//! Long-running console session: poller and token refresh in the background

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::apps::controller::AppsController;
use crate::authn::session::{SessionStore, SessionStoreExt};
use crate::errors::ConsoleError;
use crate::workers::poller::{self, PollEvent};
use crate::workers::token_refresh;

/// Run the background workers until `shutdown_signal` resolves. Poll
/// results are delivered on `events`.
pub async fn run(
    options: AppOptions,
    events: mpsc::UnboundedSender<PollEvent>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Initializing console session...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, events, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start console session: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    events: mpsc::UnboundedSender<PollEvent>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, ConsoleError> {
    let app_state = init_app_state(options, shutdown_manager).await?;

    if options.enable_token_refresh {
        init_token_refresh_worker(
            app_state.session.clone(),
            options.token_refresh_worker.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    if !app_state.session.is_authenticated() {
        return Err(ConsoleError::NotAuthenticated);
    }

    if options.enable_poller {
        init_poller_worker(
            options.poller.clone(),
            app_state.apps.clone(),
            events,
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    Ok(app_state)
}

async fn init_app_state(
    options: &AppOptions,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, ConsoleError> {
    let app_state = Arc::new(AppState::init(options).await?);
    shutdown_manager.with_app_state(app_state.clone())?;
    Ok(app_state)
}

async fn init_token_refresh_worker(
    session: Arc<SessionStore>,
    options: token_refresh::Options,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing token refresh worker...");

    refresh_if_expired(&session).await;

    let token_refresh_handle = tokio::spawn(async move {
        token_refresh::run(
            &options,
            session.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_token_refresh_worker_handle(token_refresh_handle)?;
    Ok(())
}

/// Refresh a restored session whose access token has already expired
pub async fn refresh_if_expired(session: &SessionStore) {
    if !session.is_authenticated() {
        return;
    }
    let expired = session
        .snapshot()
        .access_claims()
        .is_some_and(|claims| claims.is_expired());
    if expired {
        info!("Access token expired, refreshing...");
        if !session.refresh_auth().await {
            warn!("Could not refresh expired session");
        }
    }
}

async fn init_poller_worker(
    options: poller::Options,
    controller: Arc<AppsController>,
    events: mpsc::UnboundedSender<PollEvent>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing poller worker...");

    let poller_handle = tokio::spawn(async move {
        poller::run(
            &options,
            controller.as_ref(),
            &events,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_poller_worker_handle(poller_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    poller_worker_handle: Option<JoinHandle<()>>,
    token_refresh_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            poller_worker_handle: None,
            token_refresh_worker_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), ConsoleError> {
        if self.app_state.is_some() {
            return Err(ConsoleError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_token_refresh_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), ConsoleError> {
        if self.token_refresh_worker_handle.is_some() {
            return Err(ConsoleError::ShutdownError(
                "token_refresh_handle already set".to_string(),
            ));
        }
        self.token_refresh_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_poller_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.poller_worker_handle.is_some() {
            return Err(ConsoleError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ConsoleError> {
        let _ = self.shutdown_tx.send(());

        let max_delay = self.lifecycle_options.max_shutdown_delay;
        match tokio::time::timeout(max_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Shutdown timed out after {:?}", max_delay);
                Err(ConsoleError::ShutdownError(format!(
                    "timed out after {:?}",
                    max_delay
                )))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ConsoleError> {
        info!("Shutting down console session...");

        // 1. Token refresh worker
        if let Some(handle) = self.token_refresh_worker_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 2. Poller worker
        if let Some(handle) = self.poller_worker_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 3. App state, persists the session
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
