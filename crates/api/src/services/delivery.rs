//! Delivery recorder.
//!
//! Wraps the provider send so every attempt writes exactly one tracking row:
//! success records `sent` with the provider message ID, provider failure
//! records `failed` with `retry_count = 0`. Retries later mutate the same
//! row; they never come back through here.

use crate::middleware::metrics::record_email_send;
use crate::services::email::EmailService;
use domain::models::{EmailType, NO_ORDER};
use persistence::entities::EmailTrackingEntity;
use persistence::repositories::email_tracking::NewTrackingRecord;
use persistence::repositories::{EmailTrackingRepository, PricingGuideRepository};
use shared::crypto::generate_tracking_token;
use shared::validation::email_domain;
use tracing::{info, warn};

/// Sends emails and records the outcome of every attempt.
pub struct DeliveryService {
    email: EmailService,
    tracking: EmailTrackingRepository,
    pricing_guide: PricingGuideRepository,
    sender_domain: String,
}

impl DeliveryService {
    pub fn new(
        email: EmailService,
        tracking: EmailTrackingRepository,
        pricing_guide: PricingGuideRepository,
        sender_email: &str,
    ) -> Self {
        let sender_domain = email_domain(sender_email).unwrap_or_default();
        Self {
            email,
            tracking,
            pricing_guide,
            sender_domain,
        }
    }

    /// Sends one email and writes its tracking row. Provider failures are
    /// recorded, not returned: the row enters the retry pipeline instead.
    pub async fn send_tracked(
        &self,
        email_type: EmailType,
        recipient: &str,
        order_id: Option<&str>,
    ) -> Result<EmailTrackingEntity, sqlx::Error> {
        let token = generate_tracking_token();
        self.send_with_token(email_type, recipient, order_id.unwrap_or(NO_ORDER), &token)
            .await
    }

    /// Creates a pricing guide request and sends the guide. The request and
    /// the tracking row share one token, so the pixel and the unsubscribe
    /// link resolve in both tables.
    pub async fn send_pricing_guide(
        &self,
        recipient: &str,
        name: Option<&str>,
        phone: Option<&str>,
        zip_code: Option<&str>,
        request_type: &str,
    ) -> Result<EmailTrackingEntity, sqlx::Error> {
        let token = generate_tracking_token();

        self.pricing_guide
            .create(recipient, name, phone, zip_code, request_type, &token)
            .await?;

        let entity = self
            .send_with_token(EmailType::PricingGuide, recipient, NO_ORDER, &token)
            .await?;

        if entity.status() == Some(domain::models::EmailStatus::Sent) {
            self.pricing_guide.mark_sent(&token).await?;
        }

        Ok(entity)
    }

    async fn send_with_token(
        &self,
        email_type: EmailType,
        recipient: &str,
        order_id: &str,
        token: &str,
    ) -> Result<EmailTrackingEntity, sqlx::Error> {
        let message = self
            .email
            .build_message(email_type, recipient, order_id, token);

        let record = NewTrackingRecord {
            order_id,
            email_type: email_type.as_str(),
            recipient,
            sender_domain: &self.sender_domain,
            tracking_token: token,
        };

        match self.email.send(&message).await {
            Ok(outcome) => {
                record_email_send("sent");
                let entity = self
                    .tracking
                    .create_sent(record, outcome.provider_message_id.as_deref())
                    .await?;
                info!(
                    tracking_id = %entity.tracking_id,
                    recipient = %recipient,
                    email_type = %email_type.as_str(),
                    "Email sent and recorded"
                );
                Ok(entity)
            }
            Err(err) => {
                record_email_send("failed");
                let entity = self.tracking.create_failed(record, &err.to_string()).await?;
                warn!(
                    tracking_id = %entity.tracking_id,
                    recipient = %recipient,
                    error = %err,
                    "Send failed, recorded for retry"
                );
                Ok(entity)
            }
        }
    }
}
