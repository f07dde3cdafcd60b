//! Session store against the fake backend

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use easytp::authn::session::{SessionStoreExt, STORAGE_KEY};
use easytp::errors::ConsoleError;
use easytp::filesys::file::File;
use easytp::storage::kv::{FileKvStore, KeyValueStore, MemoryKvStore};
use openapi_client::models::UserRole;

use crate::common::{FakeServer, PASSWORD, USERNAME};

#[tokio::test]
async fn test_login_sets_and_persists_session() {
    let server = FakeServer::start().await;
    let storage = Arc::new(MemoryKvStore::new());
    let state = server.state_with(storage.clone());

    let user = state
        .session
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .unwrap();
    assert_eq!(user.username, USERNAME);
    assert_eq!(user.role, UserRole::Student);

    let session = state.session.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.access_token.unwrap().expose_secret(), "access-1");
    assert_eq!(session.refresh_token.unwrap().expose_secret(), "refresh-1");
    assert!(session.error.is_none());

    let persisted = storage.get(STORAGE_KEY).await.unwrap().unwrap();
    assert!(persisted.contains("\"is_authenticated\":true"));
    assert!(persisted.contains("refresh-1"));
}

#[tokio::test]
async fn test_failed_login_clears_session() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    let err = state
        .session
        .login(USERNAME, &SecretString::from("wrong-password"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 401);

    let session = state.session.snapshot();
    assert!(!session.is_authenticated);
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
    assert_eq!(session.error.as_deref(), Some("Invalid credentials"));
}

#[tokio::test]
async fn test_guest_login() {
    let server = FakeServer::start().await;
    let state = server.state();

    let user = state.session.continue_as_guest().await.unwrap();
    assert_eq!(user.role, UserRole::Guest);
    assert!(state.session.is_authenticated());
}

#[tokio::test]
async fn test_logout_does_not_wait_for_backend() {
    let server = FakeServer::start().await;
    server.backend().logout_delay = Some(Duration::from_secs(10));

    let storage = Arc::new(MemoryKvStore::new());
    let state = server.state_with(storage.clone());
    state
        .session
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .unwrap();

    let invalidation = tokio::time::timeout(Duration::from_secs(1), state.session.logout())
        .await
        .expect("logout blocked on the network");

    let session = state.session.snapshot();
    assert!(!session.is_authenticated);
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
    assert!(storage.get(STORAGE_KEY).await.unwrap().is_none());

    invalidation.abort();
}

#[tokio::test]
async fn test_logout_tells_backend() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    state.logout(Duration::from_secs(2)).await;
    assert_eq!(server.backend().logout_calls, 1);
    assert!(!state.session.is_authenticated());
}

#[tokio::test]
async fn test_refresh_with_rotation() {
    let server = FakeServer::start().await;
    server.backend().rotate_refresh = true;
    let state = server.signed_in().await;

    assert!(state.session.refresh_auth().await);

    let session = state.session.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.access_token.unwrap().expose_secret(), "access-1-next");
    assert_eq!(
        session.refresh_token.unwrap().expose_secret(),
        "refresh-1-next"
    );
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_without_rotation() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    assert!(state.session.refresh_auth().await);
    let session = state.session.snapshot();
    assert_eq!(session.access_token.unwrap().expose_secret(), "access-1-next");
    assert_eq!(session.refresh_token.unwrap().expose_secret(), "refresh-1");
}

#[tokio::test]
async fn test_failed_refresh_logs_out() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    server.backend().reject_refresh = true;

    assert!(!state.session.refresh_auth().await);
    assert!(!state.session.is_authenticated());
    assert!(state.session.snapshot().refresh_token.is_none());
}

#[tokio::test]
async fn test_unauthorized_response_logs_out() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    server.backend().reject_apps = true;

    let err = state.apps.refresh().await.unwrap_err();
    assert_eq!(err.status(), 401);
    assert!(!state.session.is_authenticated());

    // no token left to send
    assert!(matches!(
        state.apps.refresh().await,
        Err(ConsoleError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let server = FakeServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = Arc::new(File::new(dir.path().join("session.json")));

    {
        let state = server.state_with(Arc::new(FileKvStore::new(file.clone())));
        state
            .session
            .login(USERNAME, &SecretString::from(PASSWORD))
            .await
            .unwrap();
        state.shutdown().await.unwrap();
    }

    let state = server.state_with(Arc::new(FileKvStore::new(file)));
    assert!(!state.session.is_authenticated());
    state.session.load().await.unwrap();
    assert!(state.session.is_authenticated());
    assert_eq!(state.session.user().unwrap().username, USERNAME);

    // the restored token is accepted by the backend
    assert_eq!(state.apps.refresh().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_newer_session() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;
    {
        let mut backend = server.backend();
        backend.reject_refresh = true;
        backend.refresh_delay = Some(Duration::from_millis(300));
    }

    let session = state.session.clone();
    let refresh = tokio::spawn(async move { session.refresh_auth().await });

    // sign in again while the stale refresh is still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.backend().refresh_token = "refresh-2".to_string();
    state
        .session
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .unwrap();

    assert!(refresh.await.unwrap());
    let session = state.session.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.refresh_token.unwrap().expose_secret(), "refresh-2");
}
