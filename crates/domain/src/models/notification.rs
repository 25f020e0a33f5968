//! Admin notification domain model.
//!
//! Notifications are write-only from the pipeline's perspective; an external
//! admin feed consumes them. Every emitting job passes a dedup key so the
//! same subject is not re-alerted within the dedup window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Window within which a notification with the same dedup key is suppressed.
pub const DEDUP_WINDOW_HOURS: i64 = 24;

/// Notification severity, mirrored in the admin feed UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSeverity {
    Info,
    Warning,
    Critical,
}

impl NotificationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationSeverity::Info => "info",
            NotificationSeverity::Warning => "warning",
            NotificationSeverity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(NotificationSeverity::Info),
            "warning" => Some(NotificationSeverity::Warning),
            "critical" => Some(NotificationSeverity::Critical),
            _ => None,
        }
    }
}

/// An alert row for the admin feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminNotification {
    pub notification_id: Uuid,
    pub notification_type: String,
    pub severity: NotificationSeverity,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A notification about to be written, before persistence assigns ids.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_type: String,
    pub severity: NotificationSeverity,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    /// Dedup key; notifications sharing a key within the window collapse.
    pub dedup_key: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewNotification {
    pub fn new(
        notification_type: impl Into<String>,
        severity: NotificationSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let notification_type = notification_type.into();
        let title = title.into();
        // Default key: same type + title within the window is one alert.
        let dedup_key = format!("{}:{}", notification_type, title);
        Self {
            notification_type,
            severity,
            title,
            message: message.into(),
            data: serde_json::Value::Null,
            dedup_key,
            expires_at: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = key.into();
        self
    }
}
