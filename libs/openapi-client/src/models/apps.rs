use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::User;

/// Status of a single deployment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Creating,
    Ready,
    Running,
    Error,
}

/// Four-step deployment pipeline reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStages {
    pub deployment: StageStatus,
    pub pod: StageStatus,
    pub service: StageStatus,
    pub ingress: StageStatus,
}

/// An application record as the backend sends it. Older backends only
/// report `deployment_status`; newer ones add the granular fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawApp {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub deployment_status: Option<bool>,
    #[serde(default)]
    pub is_deployed: Option<bool>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub stages: Option<DeploymentStages>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub novnc_url: Option<String>,
    #[serde(default)]
    pub vnc_pass: Option<String>,
}

/// `GET /apps/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppsResponse {
    #[serde(default)]
    pub apps: HashMap<String, RawApp>,
}

/// `POST /start/{name}/`. Every field is a hint and may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartAppResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stages: Option<DeploymentStages>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub novnc_url: Option<String>,
    #[serde(default)]
    pub vnc_pass: Option<String>,
}

/// `GET /dashboard/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub user: User,
    #[serde(default)]
    pub template_type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub apps_available: String,
    #[serde(default)]
    pub running_apps: Option<u64>,
    #[serde(default)]
    pub total_files: Option<u64>,
    #[serde(default)]
    pub storage_used: Option<f64>,
}
