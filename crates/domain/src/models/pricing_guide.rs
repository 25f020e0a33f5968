//! Pricing guide request domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// How the lead asked to receive the pricing guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Email,
    Download,
}

impl Default for RequestType {
    fn default() -> Self {
        RequestType::Email
    }
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Email => "email",
            RequestType::Download => "download",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(RequestType::Email),
            "download" => Some(RequestType::Download),
            _ => None,
        }
    }
}

/// One lead-capture request for the pricing guide.
///
/// `unsubscribed = true` is terminal: no follow-up sends target the address
/// until an explicit re-opt-in, which is not modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PricingGuideRequest {
    pub request_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub request_type: RequestType,
    pub tracking_token: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub unsubscribed: bool,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a pricing guide request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePricingGuideRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 10, message = "Zip code must be at most 10 characters"))]
    pub zip_code: Option<String>,

    #[serde(default)]
    pub request_type: RequestType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_roundtrip() {
        assert_eq!(RequestType::parse("email"), Some(RequestType::Email));
        assert_eq!(RequestType::parse("download"), Some(RequestType::Download));
        assert_eq!(RequestType::parse("fax"), None);
        assert_eq!(RequestType::Email.as_str(), "email");
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreatePricingGuideRequest {
            email: "lead@example.com".to_string(),
            name: Some("Pat".to_string()),
            phone: None,
            zip_code: Some("97201".to_string()),
            request_type: RequestType::Email,
        };
        assert!(request.validate().is_ok());

        let bad = CreatePricingGuideRequest {
            email: "not-an-email".to_string(),
            name: None,
            phone: None,
            zip_code: None,
            request_type: RequestType::Download,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_deserialize_camel_case_with_default_type() {
        let json = r#"{
            "email": "lead@example.com",
            "requestType": "download",
            "zipCode": "97035"
        }"#;
        let request: CreatePricingGuideRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.request_type, RequestType::Download);
        assert_eq!(request.zip_code.as_deref(), Some("97035"));

        let request: CreatePricingGuideRequest =
            serde_json::from_str(r#"{"email": "lead@example.com"}"#).unwrap();
        assert_eq!(request.request_type, RequestType::Email);
    }
}
