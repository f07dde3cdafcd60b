//! File store endpoints

use openapi_client::models::FilesResponse;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// `GET /files/[{path}/]`
    pub async fn list_files(&self, token: &str, path: &str) -> Result<FilesResponse, ConsoleError> {
        self.get(&["files", path], Some(token)).await
    }

    /// `POST /files/[{path}/]` as multipart form data
    pub async fn upload_file(
        &self,
        token: &str,
        path: &str,
        file_name: &str,
        contents: &[u8],
    ) -> Result<(), ConsoleError> {
        self.post_multipart(&["files", path], Some(token), file_name, contents)
            .await
    }

    /// `GET /download/{path}/`
    pub async fn download_file(&self, token: &str, path: &str) -> Result<Vec<u8>, ConsoleError> {
        self.get_bytes(&["download", path], Some(token)).await
    }

    /// `DELETE /files/{path}/`
    pub async fn delete_file(&self, token: &str, path: &str) -> Result<(), ConsoleError> {
        if path.is_empty() {
            return Err(ConsoleError::ValidationError(
                "Refusing to delete the root directory".to_string(),
            ));
        }
        self.delete(&["files", path], Some(token)).await
    }
}
