//! Admin-only usage statistics

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::debug;

use openapi_client::models::UsageStatsResponse;

use crate::activity::filter::UsageStatsFilter;
use crate::authn::session::SessionStore;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

pub struct ActivityLog {
    http_client: Arc<HttpClient>,
    session: Arc<SessionStore>,
}

impl ActivityLog {
    pub fn new(http_client: Arc<HttpClient>, session: Arc<SessionStore>) -> Self {
        Self {
            http_client,
            session,
        }
    }

    /// Fetch one page of activity. Non-admin sessions are refused before
    /// anything is sent.
    pub async fn fetch(&self, filter: &UsageStatsFilter) -> Result<UsageStatsResponse, ConsoleError> {
        let user = self.session.require_admin()?;
        let query = filter.to_query_pairs();
        debug!("Fetching usage statistics for {} with {:?}", user.username, query);

        let http_client = self.http_client.clone();
        self.session
            .authorized(|token| async move {
                http_client
                    .get_usage_statistics(token.expose_secret(), &query)
                    .await
            })
            .await
    }
}
