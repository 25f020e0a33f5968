//! Send-triggering endpoints for application code.
//!
//! These are the pipeline's entry points: every send flows through the
//! delivery recorder so a tracking row exists before any webhook or retry
//! can reference it.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::pricing_guide::CreatePricingGuideRequest;
use domain::models::{EmailStatus, EmailType};
use shared::validation::is_valid_email;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub recipient: String,
    /// One of: confirmation, delivery, manual, pricing_guide.
    pub email_type: String,
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub tracking_id: uuid::Uuid,
    pub status: String,
}

/// `POST /api/v1/emails/send`
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), ApiError> {
    if !is_valid_email(&request.recipient) {
        return Err(ApiError::Validation(format!(
            "Invalid recipient: {}",
            request.recipient
        )));
    }

    let email_type = EmailType::parse(&request.email_type).ok_or_else(|| {
        ApiError::Validation(format!("Unknown email type: {}", request.email_type))
    })?;

    let entity = state
        .delivery
        .send_tracked(email_type, &request.recipient, request.order_id.as_deref())
        .await?;

    // A recorded provider failure is still 202: the retry pipeline owns it.
    let accepted = entity.status() == Some(EmailStatus::Sent);
    Ok((
        if accepted { StatusCode::OK } else { StatusCode::ACCEPTED },
        Json(SendEmailResponse {
            success: accepted,
            tracking_id: entity.tracking_id,
            status: entity.status.clone(),
        }),
    ))
}

/// `POST /api/v1/pricing-guide`
pub async fn request_pricing_guide(
    State(state): State<AppState>,
    Json(request): Json<CreatePricingGuideRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), ApiError> {
    request.validate()?;

    let entity = state
        .delivery
        .send_pricing_guide(
            &request.email,
            request.name.as_deref(),
            request.phone.as_deref(),
            request.zip_code.as_deref(),
            request.request_type.as_str(),
        )
        .await?;

    let accepted = entity.status() == Some(EmailStatus::Sent);
    Ok((
        if accepted { StatusCode::OK } else { StatusCode::ACCEPTED },
        Json(SendEmailResponse {
            success: accepted,
            tracking_id: entity.tracking_id,
            status: entity.status.clone(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_camel_case() {
        let request: SendEmailRequest = serde_json::from_str(
            r#"{"recipient": "a@b.com", "emailType": "confirmation", "orderId": "ORD-1"}"#,
        )
        .unwrap();
        assert_eq!(request.email_type, "confirmation");
        assert_eq!(request.order_id.as_deref(), Some("ORD-1"));
    }

    #[test]
    fn test_pricing_guide_request_rejects_bad_email() {
        let request: CreatePricingGuideRequest =
            serde_json::from_str(r#"{"email": "not-an-email"}"#).unwrap();
        assert!(request.validate().is_err());
    }
}
