//! Email tracking entity definitions.
//!
//! Maps to the email_tracking table; one row per send attempt. Retries
//! mutate the row in place rather than inserting a new one.

use chrono::{DateTime, Utc};
use domain::models::{BounceType, EmailStatus, EmailType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for the email_tracking table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailTrackingEntity {
    pub id: i64,
    pub tracking_id: Uuid,
    pub order_id: String,
    pub email_type: String,
    pub recipient: String,
    pub sender_domain: String,
    pub provider_message_id: Option<String>,
    pub tracking_token: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
    pub opened_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub opened_count: i32,
    pub failure_reason: Option<String>,
    pub bounce_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailTrackingEntity {
    /// Parsed lifecycle status; None for rows written by a newer schema.
    pub fn status(&self) -> Option<EmailStatus> {
        EmailStatus::parse(&self.status)
    }

    pub fn email_type(&self) -> Option<EmailType> {
        EmailType::parse(&self.email_type)
    }

    pub fn bounce_type(&self) -> Option<BounceType> {
        self.bounce_type
            .as_deref()
            .map(BounceType::from_provider)
    }
}

/// Recipient bounce aggregate used by the threshold unsubscriber.
#[derive(Debug, Clone, FromRow)]
pub struct RecipientBounceCount {
    pub recipient: String,
    pub bounce_count: i64,
}
