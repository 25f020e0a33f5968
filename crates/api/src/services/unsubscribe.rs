//! Unsubscribe flows.
//!
//! Two entry points share the repository guard (`unsubscribed = FALSE`):
//! the recipient-facing link with token validation, and the automated
//! paths driven by bounces.

use crate::services::notifier::Notifier;
use domain::models::NotificationSeverity;
use domain::models::notification::NewNotification;
use persistence::repositories::PricingGuideRepository;
use tracing::{info, warn};

/// Outcome of a link-driven unsubscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// Address newly unsubscribed.
    Unsubscribed,
    /// Address was already unsubscribed; nothing changed.
    AlreadyUnsubscribed,
    /// No request matches the address/token pair.
    InvalidToken,
}

/// Handles unsubscribe requests and automated bounce-driven unsubscribes.
pub struct UnsubscribeService {
    pricing_guide: PricingGuideRepository,
}

impl UnsubscribeService {
    pub fn new(pricing_guide: PricingGuideRepository) -> Self {
        Self { pricing_guide }
    }

    /// Recipient-facing unsubscribe: the token must match a request for the
    /// address before anything is flipped.
    pub async fn unsubscribe_by_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<UnsubscribeOutcome, sqlx::Error> {
        let request = self.pricing_guide.find_by_email_and_token(email, token).await?;

        let Some(request) = request else {
            warn!(email = %email, "Unsubscribe with unknown address/token pair");
            return Ok(UnsubscribeOutcome::InvalidToken);
        };

        if request.unsubscribed {
            return Ok(UnsubscribeOutcome::AlreadyUnsubscribed);
        }

        let flipped = self.pricing_guide.unsubscribe(email).await?;
        if flipped == 0 {
            // Raced with an automated unsubscribe; treat as already done.
            return Ok(UnsubscribeOutcome::AlreadyUnsubscribed);
        }

        info!(email = %email, "Recipient unsubscribed via link");
        Ok(UnsubscribeOutcome::Unsubscribed)
    }

    /// Automated unsubscribe on a hard bounce. Returns true when the address
    /// was newly flipped; callers use that to decide whether to alert.
    pub async fn unsubscribe_bounced(
        &self,
        email: &str,
        notifier: &Notifier,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let flipped = self.pricing_guide.unsubscribe(email).await?;
        if flipped == 0 {
            return Ok(false);
        }

        info!(email = %email, reason = %reason, "Recipient auto-unsubscribed");

        notifier
            .notify(
                NewNotification::new(
                    "auto_unsubscribe",
                    NotificationSeverity::Warning,
                    "Recipient auto-unsubscribed",
                    format!("{} was unsubscribed: {}", email, reason),
                )
                .with_dedup_key(format!("auto_unsubscribe:{}", email))
                .with_data(serde_json::json!({ "email": email, "reason": reason })),
            )
            .await?;

        Ok(true)
    }
}
