//! Audit log filters

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;

/// Kinds of recorded user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Logout,
    PodStart,
    PodStop,
    FileUpload,
    FileDownload,
    FileDelete,
    AccountCreated,
    PageView,
}

impl ActivityType {
    pub const ALL: [ActivityType; 9] = [
        ActivityType::Login,
        ActivityType::Logout,
        ActivityType::PodStart,
        ActivityType::PodStop,
        ActivityType::FileUpload,
        ActivityType::FileDownload,
        ActivityType::FileDelete,
        ActivityType::AccountCreated,
        ActivityType::PageView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Login => "login",
            ActivityType::Logout => "logout",
            ActivityType::PodStart => "pod_start",
            ActivityType::PodStop => "pod_stop",
            ActivityType::FileUpload => "file_upload",
            ActivityType::FileDownload => "file_download",
            ActivityType::FileDelete => "file_delete",
            ActivityType::AccountCreated => "account_created",
            ActivityType::PageView => "page_view",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Login => "Login",
            ActivityType::Logout => "Logout",
            ActivityType::PodStart => "Pod Started",
            ActivityType::PodStop => "Pod Stopped",
            ActivityType::FileUpload => "File Uploaded",
            ActivityType::FileDownload => "File Downloaded",
            ActivityType::FileDelete => "File Deleted",
            ActivityType::AccountCreated => "Account Created",
            ActivityType::PageView => "Page View",
        }
    }

    /// Label for a raw type string from the backend
    pub fn label_for(raw: &str) -> String {
        raw.parse::<ActivityType>()
            .map(|t| t.label().to_string())
            .unwrap_or_else(|_| raw.replace('_', " "))
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .iter()
            .find(|t| t.as_str() == s.trim())
            .copied()
            .ok_or_else(|| ConsoleError::ValidationError(format!("Unknown activity type: {}", s)))
    }
}

/// Query state for the usage statistics page. Every setter other than
/// [`UsageStatsFilter::set_page`] sends the view back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageStatsFilter {
    activity_types: Vec<ActivityType>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    search: Option<String>,
    page: u32,
}

impl Default for UsageStatsFilter {
    fn default() -> Self {
        Self {
            activity_types: Vec::new(),
            start_date: None,
            end_date: None,
            search: None,
            page: 1,
        }
    }
}

impl UsageStatsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity_types(&self) -> &[ActivityType] {
        &self.activity_types
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Add the type if absent, remove it otherwise
    pub fn toggle_type(&mut self, activity_type: ActivityType) {
        if let Some(pos) = self.activity_types.iter().position(|t| *t == activity_type) {
            self.activity_types.remove(pos);
        } else {
            self.activity_types.push(activity_type);
        }
        self.page = 1;
    }

    /// Select "all activities"
    pub fn clear_types(&mut self) {
        self.activity_types.clear();
        self.page = 1;
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) {
        self.start_date = date;
        self.page = 1;
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) {
        self.end_date = date;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search.filter(|s| !s.is_empty());
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn active_filter_count(&self) -> usize {
        [
            !self.activity_types.is_empty(),
            self.start_date.is_some(),
            self.end_date.is_some(),
            self.search.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Query string pairs. The backend takes a single `activity_type`, so
    /// only the first selected type is sent.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(first) = self.activity_types.first() {
            pairs.push(("activity_type".to_string(), first.as_str().to_string()));
        }
        if let Some(date) = self.start_date {
            pairs.push(("start_date".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.end_date {
            pairs.push(("end_date".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs
    }
}
