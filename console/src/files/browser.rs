//! Personal file store: listing, upload, download and delete

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use openapi_client::models::FilesResponse;

use crate::authn::session::SessionStore;
use crate::cache::files::FilesCache;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

/// Decode a backend-encoded path for display. Paths that are not valid
/// base64 UTF-8 are returned unchanged.
pub fn decode_display_path(encoded: &str) -> String {
    if encoded.is_empty() {
        return "/".to_string();
    }
    STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| encoded.to_string())
}

pub struct FileBrowser {
    http_client: Arc<HttpClient>,
    session: Arc<SessionStore>,
    cache: FilesCache,
}

impl FileBrowser {
    pub fn new(http_client: Arc<HttpClient>, session: Arc<SessionStore>, cache: FilesCache) -> Self {
        Self {
            http_client,
            session,
            cache,
        }
    }

    pub fn cache(&self) -> &FilesCache {
        &self.cache
    }

    /// List a directory. `path` is the encoded path; "" is the root.
    pub async fn list(&self, path: &str) -> Result<FilesResponse, ConsoleError> {
        if let Some(listing) = self.cache.get_fresh(path) {
            debug!("Serving listing for '{}' from cache", path);
            return Ok(listing);
        }

        let http_client = self.http_client.clone();
        let listing = self
            .session
            .authorized(|token| async move {
                http_client.list_files(token.expose_secret(), path).await
            })
            .await?;

        self.cache.insert(path, listing.clone());
        Ok(listing)
    }

    /// Upload `contents` as `file_name` into directory `path`
    pub async fn upload(
        &self,
        path: &str,
        file_name: &str,
        contents: &[u8],
    ) -> Result<(), ConsoleError> {
        if file_name.is_empty() {
            return Err(ConsoleError::ValidationError(
                "File name is required".to_string(),
            ));
        }

        let http_client = self.http_client.clone();
        self.session
            .authorized(|token| async move {
                http_client
                    .upload_file(token.expose_secret(), path, file_name, contents)
                    .await
            })
            .await?;

        info!("Uploaded {} ({} bytes)", file_name, contents.len());
        self.cache.invalidate(path);
        Ok(())
    }

    /// Delete the entry at `path`. Only the `current_path` listing is
    /// dropped when given; otherwise every cached listing is.
    pub async fn delete(&self, path: &str, current_path: Option<&str>) -> Result<(), ConsoleError> {
        let http_client = self.http_client.clone();
        self.session
            .authorized(|token| async move {
                http_client.delete_file(token.expose_secret(), path).await
            })
            .await?;

        info!("Deleted {}", decode_display_path(path));
        match current_path {
            Some(current) => {
                self.cache.invalidate(current);
            }
            None => self.cache.clear(),
        }
        Ok(())
    }

    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ConsoleError> {
        let http_client = self.http_client.clone();
        self.session
            .authorized(|token| async move {
                http_client.download_file(token.expose_secret(), path).await
            })
            .await
    }
}
