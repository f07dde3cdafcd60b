//! Application polling, optimistic start and retries

use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, oneshot};

use easytp::apps::model::AppStatus;
use easytp::workers::poller::{self, PollEvent};

use crate::common::FakeServer;

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    server.backend().apps_failures = 2;

    let apps = state.apps.refresh().await.unwrap();
    assert_eq!(apps.len(), 2);
    assert_eq!(server.backend().apps_calls, 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    server.backend().apps_failures = 10;

    let err = state.apps.refresh().await.unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(server.backend().apps_calls, 4);
    // server errors never end the session
    assert!(state.session.snapshot().is_authenticated);
}

#[tokio::test]
async fn test_start_is_optimistic_then_reconciled() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    state.apps.refresh().await.unwrap();
    assert_eq!(state.apps.next_interval(), Duration::from_millis(200));
    let firefox_before = state.apps.store().get("firefox").unwrap();

    let response = state.apps.start("vscode").await.unwrap();
    assert_eq!(response.message.as_deref(), Some("Creating deployment"));
    assert_eq!(server.backend().started, vec!["vscode".to_string()]);

    let vscode = state.apps.store().get("vscode").unwrap();
    assert_eq!(vscode.status, AppStatus::Starting);
    assert!(vscode.is_deployed);
    assert!(!vscode.ready);
    assert!(vscode.is_speculative());
    assert_eq!(vscode.message.as_deref(), Some("Creating deployment"));
    assert!(vscode.stages.is_some());

    let firefox = state.apps.store().get("firefox").unwrap();
    assert_eq!(firefox.status, firefox_before.status);
    assert_eq!(firefox.ready, firefox_before.ready);
    assert!(!firefox.is_speculative());

    assert_eq!(state.apps.next_interval(), Duration::from_millis(20));

    // the backend has not caught up yet; the fetch wins regardless
    state.apps.refresh().await.unwrap();
    let vscode = state.apps.store().get("vscode").unwrap();
    assert_eq!(vscode.status, AppStatus::Stopped);
    assert!(!vscode.is_speculative());
}

#[tokio::test]
async fn test_stop_waits_for_fetch() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    state.apps.refresh().await.unwrap();

    state.apps.stop("firefox").await.unwrap();
    assert_eq!(server.backend().stopped, vec!["firefox".to_string()]);
    assert_eq!(
        state.apps.store().get("firefox").unwrap().status,
        AppStatus::Running
    );

    server.backend().apps = json!({
        "firefox": { "status": "stopping", "is_deployed": true, "ready": false }
    });
    state.apps.refresh().await.unwrap();
    assert_eq!(
        state.apps.store().get("firefox").unwrap().status,
        AppStatus::Stopping
    );
    assert_eq!(state.apps.next_interval(), Duration::from_millis(20));
}

#[tokio::test]
async fn test_poller_reports_warm_connection() {
    let server = FakeServer::start().await;
    server.backend().apps = json!({
        "desktop": {
            "status": "running",
            "is_deployed": true,
            "ready": true,
            "novnc_url": "https://desktop.example.test",
            "vnc_pass": "s3cret"
        }
    });
    let state = server.signed_in().await;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let controller = state.apps.clone();
    let worker = tokio::spawn(async move {
        poller::run(
            &poller::Options {
                warmup_delay: Duration::from_millis(50),
            },
            controller.as_ref(),
            &events_tx,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.await;
            }),
        )
        .await;
    });

    let warm = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events_rx.recv().await {
                Some(PollEvent::Warm { id, connection }) => return (id, connection),
                Some(_) => continue,
                None => panic!("poller stopped early"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(warm.0, "desktop");
    let connection = warm.1.unwrap();
    assert!(connection
        .direct_url()
        .starts_with("https://desktop.example.test/vnc.html?password=s3cret"));

    let _ = shutdown_tx.send(());
    worker.await.unwrap();
}

#[tokio::test]
async fn test_poller_stops_when_signed_out() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    server.backend().reject_apps = true;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let controller = state.apps.clone();
    let worker = tokio::spawn(async move {
        poller::run(
            &poller::Options::default(),
            controller.as_ref(),
            &events_tx,
            tokio::time::sleep,
            Box::pin(std::future::pending::<()>()),
        )
        .await;
    });

    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap();

    let mut saw_signed_out = false;
    while let Ok(event) = events_rx.try_recv() {
        if let PollEvent::SignedOut = event {
            saw_signed_out = true;
        }
    }
    assert!(saw_signed_out);
    assert!(!state.session.snapshot().is_authenticated);
}

#[tokio::test]
async fn test_poller_stops_promptly_on_rejected_token() {
    let server = FakeServer::start().await;
    let state = server.signed_in_default_cadence().await;
    server.backend().reject_apps = true;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let controller = state.apps.clone();
    let worker = tokio::spawn(async move {
        poller::run(
            &poller::Options::default(),
            controller.as_ref(),
            &events_tx,
            tokio::time::sleep,
            Box::pin(std::future::pending::<()>()),
        )
        .await;
    });

    // well inside the 15 s slow interval
    tokio::time::timeout(Duration::from_secs(3), worker)
        .await
        .unwrap()
        .unwrap();

    let first = events_rx.try_recv().unwrap();
    assert!(matches!(first, PollEvent::SignedOut));
    assert_eq!(server.backend().apps_calls, 1);
    assert!(!state.session.snapshot().is_authenticated);
}

#[tokio::test]
async fn test_start_and_stop_wake_the_poller() {
    let server = FakeServer::start().await;
    let state = server.signed_in_default_cadence().await;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let controller = state.apps.clone();
    let worker = tokio::spawn(async move {
        poller::run(
            &poller::Options::default(),
            controller.as_ref(),
            &events_tx,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.await;
            }),
        )
        .await;
    });

    async fn next_fetch(
        events_rx: &mut mpsc::UnboundedReceiver<PollEvent>,
    ) -> (Vec<easytp::apps::model::App>, Duration) {
        tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                match events_rx.recv().await {
                    Some(PollEvent::Fetched { apps, next_poll }) => return (apps, next_poll),
                    Some(_) => continue,
                    None => panic!("poller stopped early"),
                }
            }
        })
        .await
        .unwrap()
    }

    // settled apps: the next scheduled poll is 15 s away
    let (_, next_poll) = next_fetch(&mut events_rx).await;
    assert_eq!(next_poll, Duration::from_millis(15_000));
    assert_eq!(server.backend().apps_calls, 1);

    state.apps.start("vscode").await.unwrap();
    let (apps, _) = next_fetch(&mut events_rx).await;
    assert_eq!(server.backend().apps_calls, 2);
    let vscode = apps.iter().find(|app| app.id == "vscode").unwrap();
    assert!(!vscode.is_speculative());

    state.apps.stop("firefox").await.unwrap();
    next_fetch(&mut events_rx).await;
    assert_eq!(server.backend().apps_calls, 3);

    let _ = shutdown_tx.send(());
    worker.await.unwrap();
}
