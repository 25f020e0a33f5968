//! Admin notifier.
//!
//! Thin wrapper over the notification repository that logs whether an alert
//! was written or collapsed into an earlier one.

use domain::models::notification::NewNotification;
use persistence::repositories::NotificationRepository;
use tracing::{debug, info};

/// Writes admin notifications, with dedup handled by the store.
pub struct Notifier {
    notifications: NotificationRepository,
}

impl Notifier {
    pub fn new(notifications: NotificationRepository) -> Self {
        Self { notifications }
    }

    /// Writes a notification unless an equivalent one exists within the
    /// dedup window. Returns true when a row was actually written.
    pub async fn notify(&self, notification: NewNotification) -> Result<bool, sqlx::Error> {
        let written = self.notifications.create_deduped(&notification).await?;

        match &written {
            Some(entity) => {
                info!(
                    notification_id = %entity.notification_id,
                    notification_type = %notification.notification_type,
                    severity = %notification.severity.as_str(),
                    title = %notification.title,
                    "Admin notification created"
                );
            }
            None => {
                debug!(
                    notification_type = %notification.notification_type,
                    dedup_key = %notification.dedup_key,
                    "Admin notification suppressed by dedup window"
                );
            }
        }

        Ok(written.is_some())
    }
}
