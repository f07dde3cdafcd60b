//! Adaptive application status poller

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::apps::controller::AppsController;
use crate::apps::model::{App, VncConnection};
use crate::apps::warmup::{WarmupTracker, DEFAULT_WARMUP_DELAY};
use crate::errors::ConsoleError;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Grace period after an app reports ready
    pub warmup_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            warmup_delay: DEFAULT_WARMUP_DELAY,
        }
    }
}

/// What the poller observed
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A fetch was applied; `next_poll` is the interval chosen from it
    Fetched { apps: Vec<App>, next_poll: Duration },
    /// An app finished warming up
    Warm {
        id: String,
        connection: Option<VncConnection>,
    },
    /// A fetch failed; polling continues
    Failed { message: String },
    /// The session ended; polling stops
    SignedOut,
}

/// Run the poller worker. Each fetch picks the next interval; the wait ends
/// early on an invalidation or a pending warm-up deadline.
pub async fn run<S, F>(
    options: &Options,
    controller: &AppsController,
    events: &mpsc::UnboundedSender<PollEvent>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    let mut warmup = WarmupTracker::new(options.warmup_delay);
    let mut next_fetch = Instant::now();

    loop {
        let now = Instant::now();
        if now >= next_fetch {
            match controller.refresh().await {
                Ok(apps) => {
                    warmup.observe(&apps, Instant::now());
                    let next_poll = controller.next_interval();
                    debug!("Fetched {} apps, next poll in {:?}", apps.len(), next_poll);
                    next_fetch = Instant::now() + next_poll;
                    let _ = events.send(PollEvent::Fetched { apps, next_poll });
                }
                // a 401/403 has already signed the session out
                Err(e) if matches!(e, ConsoleError::NotAuthenticated) || e.is_auth_failure() => {
                    info!("Session ended, poller stopping: {}", e);
                    warmup.clear();
                    let _ = events.send(PollEvent::SignedOut);
                    return;
                }
                Err(e) => {
                    error!("Failed to fetch apps: {}", e);
                    next_fetch = Instant::now() + controller.next_interval();
                    let _ = events.send(PollEvent::Failed {
                        message: e.user_message(),
                    });
                }
            }
        }

        for id in warmup.tick(Instant::now()) {
            // current record, so a stale timer never exposes a stopped app
            let connection = controller
                .store()
                .get(&id)
                .filter(|app| app.ready)
                .and_then(|app| app.connection());
            if connection.is_some() {
                info!("{} is ready to connect", id);
            }
            let _ = events.send(PollEvent::Warm { id, connection });
        }

        let wake_at = warmup
            .next_deadline()
            .map_or(next_fetch, |deadline| deadline.min(next_fetch));
        let wait = wake_at.saturating_duration_since(Instant::now());

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = controller.invalidated() => {
                debug!("Apps invalidated, fetching now");
                next_fetch = Instant::now();
            }
            _ = sleep_fn(wait) => {}
        }
    }
}
