//! Bounce classifier and delivery-event processor.
//!
//! Consumes provider webhook events. Bounces are matched to tracking rows by
//! provider message ID, falling back to the recipient's most recent record;
//! unmatched bounces get a fresh terminal row so no bounce is ever lost.
//! Hard bounces also unsubscribe the recipient immediately.

use crate::middleware::metrics::{record_open_tracked, record_webhook_event};
use crate::services::notifier::Notifier;
use crate::services::unsubscribe::UnsubscribeService;
use domain::models::webhook_event::{EmailEvent, EVENT_BOUNCED, EVENT_DELIVERED, EVENT_OPENED};
use domain::models::BounceType;
use persistence::repositories::{EmailTrackingRepository, PricingGuideRepository};
use tracing::{debug, info, warn};

/// Processes provider delivery events against tracking state.
pub struct BounceProcessor {
    tracking: EmailTrackingRepository,
    unsubscribe: UnsubscribeService,
    pricing_guide: PricingGuideRepository,
    notifier: Notifier,
}

impl BounceProcessor {
    pub fn new(
        tracking: EmailTrackingRepository,
        unsubscribe: UnsubscribeService,
        pricing_guide: PricingGuideRepository,
        notifier: Notifier,
    ) -> Self {
        Self {
            tracking,
            unsubscribe,
            pricing_guide,
            notifier,
        }
    }

    /// Applies one provider event. Unknown event types are acknowledged
    /// without effect. Returns true when the event changed any state.
    pub async fn process(&self, event: &EmailEvent) -> Result<bool, sqlx::Error> {
        record_webhook_event(&event.event_type);

        match event.event_type.as_str() {
            EVENT_BOUNCED => self.process_bounce(event).await,
            EVENT_DELIVERED => self.process_delivered(event).await,
            EVENT_OPENED => self.process_opened(event).await,
            other => {
                debug!(event_type = %other, "Ignoring unhandled provider event");
                Ok(false)
            }
        }
    }

    async fn process_bounce(&self, event: &EmailEvent) -> Result<bool, sqlx::Error> {
        let Some(recipient) = event.recipient() else {
            warn!("Bounce event without recipient, ignoring");
            return Ok(false);
        };

        let detail = event.data.bounce.as_ref();
        let bounce_type = detail
            .and_then(|b| b.bounce_type.as_deref())
            .map(BounceType::from_provider)
            .unwrap_or(BounceType::Hard);
        let reason = detail.and_then(|b| b.reason.as_deref());

        let record = match event.data.email_id.as_deref() {
            Some(message_id) => self.tracking.find_by_provider_message_id(message_id).await?,
            None => None,
        };
        let record = match record {
            Some(record) => Some(record),
            None => self.tracking.find_latest_by_recipient(recipient).await?,
        };

        let changed = match record {
            Some(record) => {
                let updated = self
                    .tracking
                    .mark_bounced(record.tracking_id, bounce_type.as_str(), reason)
                    .await?;
                if !updated {
                    debug!(
                        tracking_id = %record.tracking_id,
                        "Bounce replay on already-bounced record"
                    );
                }
                updated
            }
            None => {
                // No record of this email; write a terminal row directly.
                let token = shared::crypto::generate_tracking_token();
                self.tracking
                    .create_bounced(
                        recipient,
                        "manual",
                        &token,
                        event.data.email_id.as_deref(),
                        bounce_type.as_str(),
                        reason,
                    )
                    .await?;
                info!(recipient = %recipient, "Bounce recorded for untracked email");
                true
            }
        };

        if bounce_type == BounceType::Hard {
            let reason_text = reason.unwrap_or("hard bounce");
            self.unsubscribe
                .unsubscribe_bounced(recipient, &self.notifier, reason_text)
                .await?;
        }

        info!(
            recipient = %recipient,
            bounce_type = %bounce_type.as_str(),
            changed,
            "Bounce event processed"
        );

        Ok(changed)
    }

    async fn process_delivered(&self, event: &EmailEvent) -> Result<bool, sqlx::Error> {
        let Some(message_id) = event.data.email_id.as_deref() else {
            debug!("Delivered event without message ID, ignoring");
            return Ok(false);
        };

        let Some(record) = self.tracking.find_by_provider_message_id(message_id).await? else {
            debug!(message_id = %message_id, "Delivered event for unknown message");
            return Ok(false);
        };

        let updated = self.tracking.mark_delivered(record.tracking_id).await?;
        if updated {
            info!(tracking_id = %record.tracking_id, "Delivery confirmed");
        }
        Ok(updated)
    }

    /// Providers emit open events alongside the pixel; both paths apply the
    /// same pair of updates. A guide request shares its token with the
    /// tracking row, so the open lands in both tables.
    async fn process_opened(&self, event: &EmailEvent) -> Result<bool, sqlx::Error> {
        let Some(message_id) = event.data.email_id.as_deref() else {
            debug!("Open event without message ID, ignoring");
            return Ok(false);
        };

        let Some(record) = self.tracking.find_by_provider_message_id(message_id).await? else {
            debug!(message_id = %message_id, "Open event for unknown message");
            return Ok(false);
        };

        let opened = self.tracking.record_open(&record.tracking_token).await?;
        if opened.is_some() {
            record_open_tracked();
        }
        self.pricing_guide.mark_opened(&record.tracking_token).await?;

        Ok(opened.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::webhook_event::EmailEventData;
    use persistence::repositories::NotificationRepository;
    use sqlx::postgres::PgPoolOptions;

    // A lazy pool never connects; these tests only exercise paths that
    // return before any query is issued.
    fn processor() -> BounceProcessor {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        BounceProcessor::new(
            EmailTrackingRepository::new(pool.clone()),
            UnsubscribeService::new(PricingGuideRepository::new(pool.clone())),
            PricingGuideRepository::new(pool.clone()),
            Notifier::new(NotificationRepository::new(pool)),
        )
    }

    fn event(event_type: &str, email_id: Option<&str>) -> EmailEvent {
        EmailEvent {
            event_type: event_type.to_string(),
            created_at: None,
            data: EmailEventData {
                email_id: email_id.map(String::from),
                to: vec![],
                from: None,
                subject: None,
                bounce: None,
            },
        }
    }

    #[tokio::test]
    async fn test_unknown_event_type_acknowledged_without_effect() {
        let changed = processor()
            .process(&event("email.clicked", Some("msg_1")))
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_open_event_without_message_id_ignored() {
        let changed = processor()
            .process(&event(EVENT_OPENED, None))
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_delivered_event_without_message_id_ignored() {
        let changed = processor()
            .process(&event(EVENT_DELIVERED, None))
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_bounce_event_without_recipient_ignored() {
        let changed = processor()
            .process(&event(EVENT_BOUNCED, Some("msg_1")))
            .await
            .unwrap();
        assert!(!changed);
    }
}
