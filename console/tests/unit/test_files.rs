//! File browser against the fake backend

use tokio_test::{assert_err, assert_ok};

use crate::common::FakeServer;

fn list_calls(server: &FakeServer, path: &str) -> u32 {
    server
        .backend()
        .list_calls
        .get(path)
        .copied()
        .unwrap_or(0)
}

#[tokio::test]
async fn test_listing_is_cached() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    let listing = state.files.list("").await.unwrap();
    assert_eq!(listing.current_path, "/");
    assert_eq!(listing.files[0].name, "notes.txt");

    assert_ok!(state.files.list("").await);
    assert_eq!(list_calls(&server, ""), 1);
}

#[tokio::test]
async fn test_encoded_path_is_one_segment() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    // base64 paths may contain '/' and '='
    let listing = state.files.list("ZG9jcy9hLw==").await.unwrap();
    assert_eq!(listing.current_path, "/ZG9jcy9hLw==");
    assert_eq!(list_calls(&server, "ZG9jcy9hLw=="), 1);
}

#[tokio::test]
async fn test_upload_invalidates_directory() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    state.files.list("").await.unwrap();
    state.files.list("ZG9jcw==").await.unwrap();

    state
        .files
        .upload("", "hello.txt", b"hello world")
        .await
        .unwrap();

    {
        let backend = server.backend();
        assert_eq!(backend.uploads.len(), 1);
        let (path, body) = &backend.uploads[0];
        assert_eq!(path, "");
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("hello.txt"));
        assert!(body.contains("hello world"));
    }

    assert!(state.files.cache().get("").is_none());
    assert!(state.files.cache().get("ZG9jcw==").is_some());

    state.files.list("").await.unwrap();
    assert_eq!(list_calls(&server, ""), 2);
}

#[tokio::test]
async fn test_upload_requires_file_name() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    assert_err!(state.files.upload("", "", b"data").await);
    assert!(server.backend().uploads.is_empty());
}

#[tokio::test]
async fn test_delete_invalidation_scope() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    state.files.list("").await.unwrap();
    state.files.list("ZG9jcw==").await.unwrap();

    state
        .files
        .delete("bm90ZXMudHh0", Some("ZG9jcw=="))
        .await
        .unwrap();
    assert_eq!(server.backend().deleted, vec!["bm90ZXMudHh0".to_string()]);
    assert!(state.files.cache().get("ZG9jcw==").is_none());
    assert!(state.files.cache().get("").is_some());

    state.files.delete("bm90ZXMudHh0", None).await.unwrap();
    assert!(state.files.cache().is_empty());
}

#[tokio::test]
async fn test_delete_root_is_refused() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    assert_err!(state.files.delete("", None).await);
    assert!(server.backend().deleted.is_empty());
}

#[tokio::test]
async fn test_download() {
    let server = FakeServer::start().await;
    let state = server.signed_in().await;

    let bytes = state.files.download("bm90ZXMudHh0").await.unwrap();
    assert_eq!(bytes, b"contents of bm90ZXMudHh0");
}
