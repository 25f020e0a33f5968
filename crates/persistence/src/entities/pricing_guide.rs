//! Pricing guide request entity definitions.

use chrono::{DateTime, Utc};
use domain::models::RequestType;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for the pricing_guide_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct PricingGuideRequestEntity {
    pub id: i64,
    pub request_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub request_type: String,
    pub tracking_token: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub unsubscribed: bool,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PricingGuideRequestEntity {
    pub fn request_type(&self) -> Option<RequestType> {
        RequestType::parse(&self.request_type)
    }
}
