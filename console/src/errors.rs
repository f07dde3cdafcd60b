//! Error types for the EasyTP console

use thiserror::Error;

/// Main error type for the EasyTP console
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The request never produced a response (status 0)
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// HTTP status associated with the error. Transport failures and local
    /// errors report 0.
    pub fn status(&self) -> u16 {
        match self {
            ConsoleError::Api { status, .. } => *status,
            _ => 0,
        }
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), 401 | 403)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// 5xx responses and transport failures are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            ConsoleError::Api { status, .. } => *status >= 500,
            ConsoleError::Transport(_) => true,
            _ => false,
        }
    }

    /// Short message suitable for showing next to the failed action
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ConsoleError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("An error occurred")
                    .to_string(),
                details: None,
            },
            None => ConsoleError::Transport(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ConsoleError {
    fn from(err: anyhow::Error) -> Self {
        ConsoleError::Internal(err.to_string())
    }
}
