//! API models

mod apps;
mod auth;
mod files;
mod stats;

use serde::{Deserialize, Serialize};

pub use apps::*;
pub use auth::*;
pub use files::*;
pub use stats::*;

/// Error response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// First human-readable message the backend provided, if any
    pub fn best_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.detail.as_deref())
            .or(self.error.as_deref())
            .filter(|m| !m.is_empty())
    }
}
