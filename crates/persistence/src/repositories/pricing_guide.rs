//! Pricing guide request repository.
//!
//! Every unsubscribe update carries an `unsubscribed = FALSE` guard, which
//! makes the hard-bounce fast path and the threshold path idempotent with
//! respect to each other.

use sqlx::PgPool;

use crate::entities::PricingGuideRequestEntity;

const COLUMNS: &str = "id, request_id, email, name, phone, zip_code, request_type, \
     tracking_token, sent_at, opened_at, unsubscribed, unsubscribed_at, created_at";

/// Repository for pricing guide request operations.
pub struct PricingGuideRepository {
    pool: PgPool,
}

impl PricingGuideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        phone: Option<&str>,
        zip_code: Option<&str>,
        request_type: &str,
        tracking_token: &str,
    ) -> Result<PricingGuideRequestEntity, sqlx::Error> {
        sqlx::query_as::<_, PricingGuideRequestEntity>(&format!(
            r#"
            INSERT INTO pricing_guide_requests
                (email, name, phone, zip_code, request_type, tracking_token)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(email)
        .bind(name)
        .bind(phone)
        .bind(zip_code)
        .bind(request_type)
        .bind(tracking_token)
        .fetch_one(&self.pool)
        .await
    }

    /// Request matching both the address and its unsubscribe token.
    pub async fn find_by_email_and_token(
        &self,
        email: &str,
        tracking_token: &str,
    ) -> Result<Option<PricingGuideRequestEntity>, sqlx::Error> {
        sqlx::query_as::<_, PricingGuideRequestEntity>(&format!(
            r#"
            SELECT {COLUMNS} FROM pricing_guide_requests
            WHERE email = $1 AND tracking_token = $2
            "#,
        ))
        .bind(email)
        .bind(tracking_token)
        .fetch_optional(&self.pool)
        .await
    }

    /// Marks the request sent after a successful guide delivery.
    pub async fn mark_sent(&self, tracking_token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pricing_guide_requests
            SET sent_at = COALESCE(sent_at, now())
            WHERE tracking_token = $1
            "#,
        )
        .bind(tracking_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records the first open for the guide email, if any row matches.
    pub async fn mark_opened(&self, tracking_token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pricing_guide_requests
            SET opened_at = COALESCE(opened_at, now())
            WHERE tracking_token = $1
            "#,
        )
        .bind(tracking_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unsubscribes every request for an address. Returns the number of rows
    /// actually flipped; zero means the address was already unsubscribed (or
    /// unknown), so callers can skip duplicate notifications.
    pub async fn unsubscribe(&self, email: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pricing_guide_requests
            SET unsubscribed = TRUE, unsubscribed_at = now()
            WHERE email = $1 AND unsubscribed = FALSE
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
