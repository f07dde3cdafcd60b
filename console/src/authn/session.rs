//! Client-side session store

use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use openapi_client::models::{AuthResponse, LoginRequest, SignupRequest, User};

use crate::authn::token::BearerToken;
use crate::authn::validation::{validate_login, validate_signup};
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::storage::kv::KeyValueStore;

/// Key the session is persisted under
pub const STORAGE_KEY: &str = "auth-storage";

/// Current identity and token pair.
///
/// `is_authenticated` holds only while both tokens are present and came
/// from a successful auth response.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub is_authenticated: bool,

    /// Not persisted
    pub is_loading: bool,

    /// Message from the last failed auth action. Not persisted
    pub error: Option<String>,
}

impl Session {
    fn authenticated(response: AuthResponse) -> Self {
        Self {
            user: Some(response.user),
            access_token: Some(SecretString::from(response.access)),
            refresh_token: Some(SecretString::from(response.refresh)),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    /// Decoded access token, if it is a JWT
    pub fn access_claims(&self) -> Option<BearerToken> {
        self.access_token
            .as_ref()
            .and_then(|t| BearerToken::decode(t.expose_secret()).ok())
    }
}

/// On-disk shape of a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSession {
    user: Option<User>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    is_authenticated: bool,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            access_token: session
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            is_authenticated: session.is_authenticated,
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(persisted: PersistedSession) -> Self {
        let is_authenticated = persisted.is_authenticated
            && persisted.access_token.is_some()
            && persisted.refresh_token.is_some();
        Self {
            user: persisted.user,
            access_token: persisted.access_token.map(SecretString::from),
            refresh_token: persisted.refresh_token.map(SecretString::from),
            is_authenticated,
            is_loading: false,
            error: None,
        }
    }
}

/// Session operations used by background workers
#[async_trait]
pub trait SessionStoreExt: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Exchange the refresh token for a new access token. A failure logs the
    /// session out and returns false.
    async fn refresh_auth(&self) -> bool;
}

/// Holds the session, persists it and talks to the auth endpoints
pub struct SessionStore {
    http_client: Arc<HttpClient>,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Session>,
}

impl SessionStore {
    pub fn new(http_client: Arc<HttpClient>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            http_client,
            storage,
            state: RwLock::new(Session::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Rehydrate the session from durable storage
    pub async fn load(&self) -> Result<(), ConsoleError> {
        let Some(raw) = self.storage.get(STORAGE_KEY).await? else {
            debug!("No persisted session");
            return Ok(());
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) => {
                let session = Session::from(persisted);
                debug!(
                    "Restored session (authenticated: {})",
                    session.is_authenticated
                );
                *self.write() = session;
            }
            Err(e) => {
                warn!("Discarding unreadable persisted session: {}", e);
                self.storage.remove(STORAGE_KEY).await?;
            }
        }
        Ok(())
    }

    /// Write the persisted fields to durable storage
    pub async fn save(&self) -> Result<(), ConsoleError> {
        let persisted = PersistedSession::from(&*self.read());
        if !persisted.is_authenticated && persisted.access_token.is_none() {
            return self.storage.remove(STORAGE_KEY).await;
        }
        let raw = serde_json::to_string(&persisted)?;
        self.storage.set(STORAGE_KEY, raw).await
    }

    async fn persist(&self) {
        if let Err(e) = self.save().await {
            warn!("Failed to persist session: {}", e);
        }
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn access_token(&self) -> Result<SecretString, ConsoleError> {
        let state = self.read();
        match (&state.access_token, state.is_authenticated) {
            (Some(token), true) => Ok(token.clone()),
            _ => Err(ConsoleError::NotAuthenticated),
        }
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    fn begin(&self) {
        let mut state = self.write();
        state.is_loading = true;
        state.error = None;
    }

    /// Apply the outcome of login/signup. Failures clear the session.
    async fn complete(
        &self,
        result: Result<AuthResponse, ConsoleError>,
        fallback: &str,
    ) -> Result<User, ConsoleError> {
        match result {
            Ok(response) => {
                let user = response.user.clone();
                *self.write() = Session::authenticated(response);
                self.persist().await;
                info!("Signed in as {} ({})", user.username, user.role.as_str());
                Ok(user)
            }
            Err(e) => {
                let message = error_message(&e, fallback);
                *self.write() = Session::failed(message);
                self.persist().await;
                Err(e)
            }
        }
    }

    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, ConsoleError> {
        validate_login(username, password.expose_secret())?;
        self.begin();

        let request = LoginRequest {
            username: username.to_string(),
            password: password.expose_secret().to_string(),
        };
        let result = self.http_client.login(&request).await;
        self.complete(result, "Login failed").await
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
        password_confirm: &SecretString,
    ) -> Result<User, ConsoleError> {
        validate_signup(
            username,
            email,
            password.expose_secret(),
            password_confirm.expose_secret(),
        )?;
        self.begin();

        let request = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.expose_secret().to_string(),
            password_confirm: password_confirm.expose_secret().to_string(),
        };
        let result = self.http_client.signup(&request).await;
        self.complete(result, "Signup failed").await
    }

    /// Guest login. A failure records the error but leaves the existing
    /// session fields alone.
    pub async fn continue_as_guest(&self) -> Result<User, ConsoleError> {
        self.begin();

        match self.http_client.continue_as_guest().await {
            Ok(response) => self.complete(Ok(response), "Guest access failed").await,
            Err(e) => {
                let mut state = self.write();
                state.error = Some(error_message(&e, "Guest access failed"));
                state.is_loading = false;
                Err(e)
            }
        }
    }

    /// Clear the session locally and in durable storage. The backend is
    /// told in the background; the returned handle resolves when that call
    /// finishes, and its failure is ignored.
    pub async fn logout(&self) -> JoinHandle<()> {
        let access_token = {
            let mut state = self.write();
            let token = state.access_token.take();
            *state = Session::default();
            token
        };

        let http_client = self.http_client.clone();
        let invalidation = tokio::spawn(async move {
            let token = access_token.as_ref().map(|t| t.expose_secret());
            if let Err(e) = http_client.logout(token).await {
                debug!("Background logout failed: {}", e);
            }
        });

        if let Err(e) = self.storage.remove(STORAGE_KEY).await {
            warn!("Failed to clear persisted session: {}", e);
        }
        info!("Signed out");

        invalidation
    }

    /// Log out when `error` is a 401/403
    pub async fn handle_api_error(&self, error: &ConsoleError) {
        if error.is_auth_failure() && self.read().is_authenticated {
            warn!("Backend rejected credentials ({}), signing out", error.status());
            drop(self.logout().await);
        }
    }

    /// Run an authenticated call with the current access token, signing out
    /// if the backend rejects it.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, ConsoleError>
    where
        F: FnOnce(SecretString) -> Fut,
        Fut: Future<Output = Result<T, ConsoleError>>,
    {
        let token = self.access_token()?;
        let result = call(token).await;
        if let Err(e) = &result {
            self.handle_api_error(e).await;
        }
        result
    }

    /// The current user, provided they are an administrator
    pub fn require_admin(&self) -> Result<User, ConsoleError> {
        let state = self.read();
        match &state.user {
            Some(user) if state.is_authenticated && user.role.is_admin() => Ok(user.clone()),
            Some(_) if state.is_authenticated => Err(ConsoleError::Forbidden(
                "Administrator access required".to_string(),
            )),
            _ => Err(ConsoleError::NotAuthenticated),
        }
    }
}

#[async_trait]
impl SessionStoreExt for SessionStore {
    fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    async fn refresh_auth(&self) -> bool {
        let (access_token, refresh_token) = {
            let state = self.read();
            (state.access_token.clone(), state.refresh_token.clone())
        };

        let Some(refresh_token) = refresh_token else {
            if self.is_authenticated() {
                drop(self.logout().await);
            }
            return false;
        };

        let result = self
            .http_client
            .refresh_token(
                access_token.as_ref().map(|t| t.expose_secret()),
                refresh_token.expose_secret(),
            )
            .await;

        let unchanged = |state: &Session| {
            state
                .refresh_token
                .as_ref()
                .is_some_and(|t| t.expose_secret() == refresh_token.expose_secret())
        };

        match result {
            Ok(response) => {
                {
                    let mut state = self.write();
                    if !unchanged(&*state) {
                        debug!("Session changed during refresh, discarding response");
                        return state.is_authenticated;
                    }
                    state.access_token = Some(SecretString::from(response.access));
                    if let Some(rotated) = response.refresh {
                        state.refresh_token = Some(SecretString::from(rotated));
                    }
                }
                self.persist().await;
                debug!("Access token refreshed");
                true
            }
            Err(e) => {
                {
                    let state = self.read();
                    if !unchanged(&*state) {
                        debug!("Session changed during failed refresh, keeping it: {}", e);
                        return state.is_authenticated;
                    }
                }
                warn!("Token refresh failed, signing out: {}", e);
                drop(self.logout().await);
                false
            }
        }
    }
}

fn error_message(error: &ConsoleError, fallback: &str) -> String {
    match error {
        ConsoleError::Api { message, .. } if !message.is_empty() => message.clone(),
        ConsoleError::Api { .. } => fallback.to_string(),
        other => other.to_string(),
    }
}
