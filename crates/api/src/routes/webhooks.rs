//! Provider webhook endpoint.
//!
//! Verifies the HMAC signature when a signing secret is configured, then
//! hands the event to the bounce processor. Unknown event types are
//! acknowledged so provider additions never cause webhook retries.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{BounceProcessor, Notifier, UnsubscribeService};
use domain::models::webhook_event::EmailEvent;
use persistence::repositories::{
    EmailTrackingRepository, NotificationRepository, PricingGuideRepository,
};

/// Signature header carried by provider webhooks: `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    /// Event type that was processed.
    pub processed: String,
}

/// `POST /api/webhooks/email-events`
pub async fn email_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let secret = &state.config.security.webhook_signing_secret;
    if !secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing webhook signature".into()))?;

        shared::crypto::verify_signature(&body, secret, signature)?;
    }

    let event: EmailEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed webhook payload");
        ApiError::Validation(format!("Malformed event payload: {}", e))
    })?;

    let processor = BounceProcessor::new(
        EmailTrackingRepository::new(state.pool.clone()),
        UnsubscribeService::new(PricingGuideRepository::new(state.pool.clone())),
        PricingGuideRepository::new(state.pool.clone()),
        Notifier::new(NotificationRepository::new(state.pool.clone())),
    );

    processor.process(&event).await?;

    Ok(Json(WebhookResponse {
        success: true,
        processed: event.event_type,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let response = WebhookResponse {
            success: true,
            processed: "email.bounced".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["processed"], "email.bounced");
    }

    #[test]
    fn test_signature_header_name() {
        assert_eq!(SIGNATURE_HEADER, "X-Webhook-Signature");
    }
}
