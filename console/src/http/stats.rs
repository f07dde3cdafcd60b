//! Admin usage statistics endpoint

use openapi_client::models::UsageStatsResponse;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// `GET /usage_statistics/?{filters}`
    pub async fn get_usage_statistics(
        &self,
        token: &str,
        query: &[(String, String)],
    ) -> Result<UsageStatsResponse, ConsoleError> {
        self.get_with_query(&["usage_statistics"], query, Some(token))
            .await
    }
}
