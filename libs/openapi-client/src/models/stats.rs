use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_activities: u64,
    pub today_activities: u64,
    pub week_activities: u64,
    pub unique_users: u64,
}

/// One audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: i64,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub user_username: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub activity_type: String,
    #[serde(default)]
    pub activity_display: String,
    pub timestamp: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl UserActivity {
    /// Name to display for the acting user
    pub fn display_user(&self) -> &str {
        self.user_username
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub count: u64,
    pub num_pages: u32,
    pub current_page: u32,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(default)]
    pub next_page_number: Option<u32>,
    #[serde(default)]
    pub previous_page_number: Option<u32>,
}

/// `GET /usage_statistics/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatsResponse {
    pub stats: ActivityStats,
    #[serde(default)]
    pub activities: Vec<UserActivity>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub filters: serde_json::Map<String, serde_json::Value>,
}
