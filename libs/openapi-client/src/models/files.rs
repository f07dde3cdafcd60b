use serde::{Deserialize, Serialize};

/// A file or directory entry. `path` is base64-encoded by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileItem {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub escaped_name: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StorageUsage {
    pub current_mb: f64,
    pub limit_mb: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FilePermissions {
    pub can_upload: bool,
    pub can_delete: bool,
    pub can_download: bool,
}

/// `GET /files/[{path}/]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub current_path: String,
    #[serde(default)]
    pub parent_path_encoded: Option<String>,
    #[serde(default)]
    pub files: Vec<FileItem>,
    #[serde(default)]
    pub directories: Vec<FileItem>,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(default)]
    pub storage_usage: StorageUsage,
    #[serde(default)]
    pub permissions: FilePermissions,
}
