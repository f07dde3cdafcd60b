//! Authentication endpoints

use openapi_client::models::{
    AuthResponse, LoginRequest, SignupRequest, TokenRefreshRequest, TokenRefreshResponse,
};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// `POST /auth/login/`
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ConsoleError> {
        self.post(&["auth", "login"], None, Some(credentials)).await
    }

    /// `POST /auth/signup/`
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ConsoleError> {
        self.post(&["auth", "signup"], None, Some(request)).await
    }

    /// `POST /auth/continue-as-guest/`
    pub async fn continue_as_guest(&self) -> Result<AuthResponse, ConsoleError> {
        self.post_empty(&["auth", "continue-as-guest"], None).await
    }

    /// `POST /auth/refresh/`
    pub async fn refresh_token(
        &self,
        access_token: Option<&str>,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, ConsoleError> {
        let body = TokenRefreshRequest {
            refresh: refresh_token.to_string(),
        };
        self.post(&["auth", "refresh"], access_token, Some(&body))
            .await
    }

    /// `POST /auth/logout/`
    pub async fn logout(&self, access_token: Option<&str>) -> Result<(), ConsoleError> {
        let _: serde_json::Value = self.post_empty(&["auth", "logout"], access_token).await?;
        Ok(())
    }
}
