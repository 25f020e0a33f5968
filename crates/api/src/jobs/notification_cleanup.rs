//! Expired notification cleanup job.

use persistence::repositories::NotificationRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Background job that purges expired admin notifications.
pub struct NotificationCleanupJob {
    pool: PgPool,
}

impl NotificationCleanupJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for NotificationCleanupJob {
    fn name(&self) -> &'static str {
        "notification_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Daily
    }

    async fn execute(&self) -> Result<(), String> {
        let repository = NotificationRepository::new(self.pool.clone());

        let deleted = repository
            .delete_expired()
            .await
            .map_err(|e| format!("Failed to delete expired notifications: {}", e))?;

        if deleted > 0 {
            info!(deleted, "Expired notifications purged");
        }

        Ok(())
    }
}
