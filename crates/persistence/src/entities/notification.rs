//! Admin notification entity definitions.

use chrono::{DateTime, Utc};
use domain::models::NotificationSeverity;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for the admin_notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminNotificationEntity {
    pub id: i64,
    pub notification_id: Uuid,
    pub notification_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub dedup_key: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AdminNotificationEntity {
    pub fn severity(&self) -> Option<NotificationSeverity> {
        NotificationSeverity::parse(&self.severity)
    }
}
