use serde::{Deserialize, Serialize};

/// Role of a dashboard user. The backend sends either the long form or a
/// single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "STUDENT", alias = "S")]
    Student,
    #[serde(rename = "TEACHER", alias = "T")]
    Teacher,
    #[serde(rename = "ADMIN", alias = "A")]
    Admin,
    #[serde(rename = "GUEST", alias = "G")]
    Guest,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Teacher => "TEACHER",
            UserRole::Admin => "ADMIN",
            UserRole::Guest => "GUEST",
        }
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub apps_available: String,
}

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Signup request
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Response to login, signup and guest login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

/// Token refresh response. `refresh` is only present when the backend
/// rotates refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
