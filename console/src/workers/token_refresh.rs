//! Token refresh worker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::authn::session::SessionStoreExt;

/// Token refresh worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Refresh interval. Access tokens live 60 minutes
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(50 * 60),
        }
    }
}

/// Run the token refresh worker. Every `interval`, refresh the session if
/// it is authenticated.
pub async fn run<T, S, F>(
    options: &Options,
    session: &T,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    T: SessionStoreExt,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Token refresh worker starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Token refresh worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }

        if !session.is_authenticated() {
            debug!("Not authenticated, skipping token refresh");
            continue;
        }

        if session.refresh_auth().await {
            debug!("Token refreshed");
        } else {
            warn!("Token refresh failed, session ended");
        }
    }
}
