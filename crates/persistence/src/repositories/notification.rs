//! Admin notification repository.
//!
//! Insertion is deduplicated: a notification whose dedup key already
//! appeared within the window is dropped in a single statement, so
//! concurrent jobs cannot both insert.

use domain::models::notification::{NewNotification, DEDUP_WINDOW_HOURS};
use sqlx::PgPool;

use crate::entities::AdminNotificationEntity;

const COLUMNS: &str = "id, notification_id, notification_type, severity, title, message, \
     data, read, dedup_key, expires_at, created_at";

/// Repository for admin notification writes.
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a notification unless one with the same dedup key exists
    /// within the dedup window. Returns None when suppressed.
    pub async fn create_deduped(
        &self,
        notification: &NewNotification,
    ) -> Result<Option<AdminNotificationEntity>, sqlx::Error> {
        sqlx::query_as::<_, AdminNotificationEntity>(&format!(
            r#"
            INSERT INTO admin_notifications
                (notification_type, severity, title, message, data, dedup_key, expires_at)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM admin_notifications
                WHERE dedup_key = $6
                  AND created_at > now() - make_interval(hours => $8::int)
            )
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&notification.notification_type)
        .bind(notification.severity.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .bind(&notification.dedup_key)
        .bind(notification.expires_at)
        .bind(DEDUP_WINDOW_HOURS)
        .fetch_optional(&self.pool)
        .await
    }

    /// Drops expired notification rows; returns the number deleted.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"DELETE FROM admin_notifications WHERE expires_at IS NOT NULL AND expires_at < now()"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
