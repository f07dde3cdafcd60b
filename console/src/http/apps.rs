//! Dashboard and application endpoints

use openapi_client::models::{AppsResponse, DashboardResponse, StartAppResponse};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// `GET /dashboard/`
    pub async fn get_dashboard(&self, token: &str) -> Result<DashboardResponse, ConsoleError> {
        self.get(&["dashboard"], Some(token)).await
    }

    /// `GET /apps/`
    pub async fn get_apps(&self, token: &str) -> Result<AppsResponse, ConsoleError> {
        self.get(&["apps"], Some(token)).await
    }

    /// `POST /start/{name}/`
    pub async fn start_app(&self, token: &str, name: &str) -> Result<StartAppResponse, ConsoleError> {
        self.post_empty(&["start", name], Some(token)).await
    }

    /// `POST /stop/{name}/`
    pub async fn stop_app(&self, token: &str, name: &str) -> Result<(), ConsoleError> {
        let _: serde_json::Value = self.post_empty(&["stop", name], Some(token)).await?;
        Ok(())
    }
}
