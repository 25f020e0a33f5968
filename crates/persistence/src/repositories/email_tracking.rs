//! Email tracking repository.
//!
//! Data access for send-attempt tracking, retry claiming, and bounce
//! aggregation. Retry claiming is a single conditional UPDATE so two
//! overlapping scheduler runs can never both pick up the same record.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::email_tracking::MAX_RETRIES;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::email_tracking::{EmailTrackingEntity, RecipientBounceCount};

/// Columns returned by every query, kept in one place so RETURNING clauses
/// stay in sync with the entity.
const COLUMNS: &str = "id, tracking_id, order_id, email_type, recipient, sender_domain, \
     provider_message_id, tracking_token, status, sent_at, opened_at, failed_at, \
     last_attempt_at, retry_count, opened_count, failure_reason, bounce_type, created_at";

/// Backoff in minutes by retry count, as a SQL CASE expression. Mirrors
/// `domain::services::retry_policy::RETRY_BACKOFF_MINUTES`.
const BACKOFF_CASE: &str =
    "CASE retry_count WHEN 0 THEN 5 WHEN 1 THEN 30 WHEN 2 THEN 120 ELSE 360 END";

/// SET clause of the retry claim. The claim stamps `last_attempt_at` so
/// stale-claim release measures age from the claim itself. The previous
/// attempt can already be a full backoff step in the past, which must not
/// make a fresh claim look stale to an overlapping run.
const CLAIM_SET: &str = "status = 'retried', last_attempt_at = now()";

/// Fields identifying a new send attempt.
#[derive(Debug, Clone)]
pub struct NewTrackingRecord<'a> {
    pub order_id: &'a str,
    pub email_type: &'a str,
    pub recipient: &'a str,
    pub sender_domain: &'a str,
    pub tracking_token: &'a str,
}

/// Repository for email tracking operations.
pub struct EmailTrackingRepository {
    pool: PgPool,
}

impl EmailTrackingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records a successful send attempt.
    pub async fn create_sent(
        &self,
        record: NewTrackingRecord<'_>,
        provider_message_id: Option<&str>,
    ) -> Result<EmailTrackingEntity, sqlx::Error> {
        let entity = sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"
            INSERT INTO email_tracking
                (order_id, email_type, recipient, sender_domain, tracking_token,
                 provider_message_id, status, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'sent', now())
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(record.order_id)
        .bind(record.email_type)
        .bind(record.recipient)
        .bind(record.sender_domain)
        .bind(record.tracking_token)
        .bind(provider_message_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    /// Records a provider-level failure on the initial send.
    pub async fn create_failed(
        &self,
        record: NewTrackingRecord<'_>,
        failure_reason: &str,
    ) -> Result<EmailTrackingEntity, sqlx::Error> {
        let entity = sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"
            INSERT INTO email_tracking
                (order_id, email_type, recipient, sender_domain, tracking_token,
                 status, sent_at, failed_at, failure_reason, retry_count)
            VALUES ($1, $2, $3, $4, $5, 'failed', now(), now(), $6, 0)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(record.order_id)
        .bind(record.email_type)
        .bind(record.recipient)
        .bind(record.sender_domain)
        .bind(record.tracking_token)
        .bind(failure_reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    /// Records a bounce reported for an email the pipeline has no record of,
    /// so webhook bounces are never lost.
    pub async fn create_bounced(
        &self,
        recipient: &str,
        email_type: &str,
        tracking_token: &str,
        provider_message_id: Option<&str>,
        bounce_type: &str,
        failure_reason: Option<&str>,
    ) -> Result<EmailTrackingEntity, sqlx::Error> {
        let entity = sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"
            INSERT INTO email_tracking
                (order_id, email_type, recipient, sender_domain, tracking_token,
                 provider_message_id, status, sent_at, failed_at, bounce_type, failure_reason)
            VALUES ('none', $1, $2, '', $3, $4, 'bounced', now(), now(), $5, $6)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(email_type)
        .bind(recipient)
        .bind(tracking_token)
        .bind(provider_message_id)
        .bind(bounce_type)
        .bind(failure_reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    pub async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<EmailTrackingEntity>, sqlx::Error> {
        sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"SELECT {COLUMNS} FROM email_tracking WHERE provider_message_id = $1"#,
        ))
        .bind(provider_message_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Most recent tracking record for a recipient, regardless of type.
    pub async fn find_latest_by_recipient(
        &self,
        recipient: &str,
    ) -> Result<Option<EmailTrackingEntity>, sqlx::Error> {
        sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"
            SELECT {COLUMNS} FROM email_tracking
            WHERE recipient = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        ))
        .bind(recipient)
        .fetch_optional(&self.pool)
        .await
    }

    /// Marks a record delivered. Only upgrades `sent`; records already
    /// opened or bounced are left alone (delivered is the narrower state).
    pub async fn mark_delivered(&self, tracking_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_tracking
            SET status = 'delivered'
            WHERE tracking_id = $1 AND status = 'sent'
            "#,
        )
        .bind(tracking_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks a record bounced in place. Already-bounced rows are untouched,
    /// which makes webhook replays idempotent.
    pub async fn mark_bounced(
        &self,
        tracking_id: Uuid,
        bounce_type: &str,
        failure_reason: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_tracking
            SET status = 'bounced',
                bounce_type = $2,
                failure_reason = COALESCE($3, failure_reason),
                failed_at = now()
            WHERE tracking_id = $1 AND status <> 'bounced'
            "#,
        )
        .bind(tracking_id)
        .bind(bounce_type)
        .bind(failure_reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies one open to the record behind a tracking token.
    ///
    /// First-open semantics in a single atomic statement: `opened_at` is set
    /// only when currently NULL, while `opened_count` always increments.
    pub async fn record_open(
        &self,
        tracking_token: &str,
    ) -> Result<Option<EmailTrackingEntity>, sqlx::Error> {
        sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"
            UPDATE email_tracking
            SET opened_at = COALESCE(opened_at, now()),
                opened_count = opened_count + 1,
                status = CASE WHEN status IN ('sent', 'delivered') THEN 'opened' ELSE status END
            WHERE tracking_token = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(tracking_token)
        .fetch_optional(&self.pool)
        .await
    }

    /// Atomically claims failed records that are due for retry.
    ///
    /// The conditional UPDATE `failed -> retried` is the claim step: a record
    /// can only be claimed once, so overlapping scheduler runs never resend
    /// the same email. `FOR UPDATE SKIP LOCKED` keeps concurrent claimers
    /// from serializing on the same rows, and the claim timestamps itself
    /// (see `CLAIM_SET`) so `release_stale_claims` never releases a claim
    /// another run took moments ago.
    pub async fn claim_due_retries(
        &self,
        limit: i64,
    ) -> Result<Vec<EmailTrackingEntity>, sqlx::Error> {
        sqlx::query_as::<_, EmailTrackingEntity>(&format!(
            r#"
            UPDATE email_tracking
            SET {CLAIM_SET}
            WHERE tracking_id IN (
                SELECT tracking_id FROM email_tracking
                WHERE status = 'failed'
                  AND retry_count < $1
                  AND COALESCE(last_attempt_at, failed_at)
                      + make_interval(mins => {BACKOFF_CASE}) <= now()
                ORDER BY COALESCE(last_attempt_at, failed_at) ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(MAX_RETRIES)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Failed records below the retry cap whose backoff has not yet elapsed.
    pub async fn count_failed_not_due(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(&format!(
            r#"
            SELECT COUNT(*) FROM email_tracking
            WHERE status = 'failed'
              AND retry_count < $1
              AND COALESCE(last_attempt_at, failed_at)
                  + make_interval(mins => {BACKOFF_CASE}) > now()
            "#,
        ))
        .bind(MAX_RETRIES)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Completes a claimed retry that succeeded: back to `sent`, failure
    /// fields cleared, attempt counted.
    pub async fn complete_retry_success(
        &self,
        tracking_id: Uuid,
        provider_message_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_tracking
            SET status = 'sent',
                provider_message_id = COALESCE($2, provider_message_id),
                failure_reason = NULL,
                failed_at = NULL,
                retry_count = retry_count + 1,
                last_attempt_at = now()
            WHERE tracking_id = $1 AND status = 'retried'
            "#,
        )
        .bind(tracking_id)
        .bind(provider_message_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Completes a claimed retry that failed: back to `failed` with the new
    /// reason, attempt counted.
    pub async fn complete_retry_failure(
        &self,
        tracking_id: Uuid,
        failure_reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_tracking
            SET status = 'failed',
                failure_reason = $2,
                retry_count = retry_count + 1,
                last_attempt_at = now()
            WHERE tracking_id = $1 AND status = 'retried'
            "#,
        )
        .bind(tracking_id)
        .bind(failure_reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Forces every exhausted failed record to a terminal hard bounce.
    ///
    /// Runs on every scheduler pass regardless of which records were touched
    /// this cycle, so exhausted records converge even if they were skipped.
    pub async fn sweep_exhausted(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_tracking
            SET status = 'bounced', bounce_type = 'hard', failed_at = COALESCE(failed_at, now())
            WHERE status = 'failed' AND retry_count >= $1
            "#,
        )
        .bind(MAX_RETRIES)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Returns stale `retried` claims to `failed` so a crash mid-retry never
    /// strands a record. Claim age is measured from `last_attempt_at`, which
    /// the claim stamps when it is taken; `sent_at` only backstops rows
    /// claimed before that column was stamped.
    pub async fn release_stale_claims(&self, older_than_minutes: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_tracking
            SET status = 'failed'
            WHERE status = 'retried'
              AND COALESCE(last_attempt_at, sent_at) < now() - make_interval(mins => $1::int)
            "#,
        )
        .bind(older_than_minutes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Recipients with at least `threshold` bounced records.
    pub async fn recipients_over_bounce_threshold(
        &self,
        threshold: i64,
    ) -> Result<Vec<RecipientBounceCount>, sqlx::Error> {
        sqlx::query_as::<_, RecipientBounceCount>(
            r#"
            SELECT recipient, COUNT(*) AS bounce_count
            FROM email_tracking
            WHERE status = 'bounced'
            GROUP BY recipient
            HAVING COUNT(*) >= $1
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
    }

    /// Distinct recipients of hard bounces since `since`.
    pub async fn hard_bounce_recipients_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT recipient FROM email_tracking
            WHERE status = 'bounced' AND bounce_type = 'hard' AND failed_at >= $1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(recipient,)| recipient).collect())
    }

    /// Emails accepted for a sending domain on one calendar day. Failed and
    /// in-flight retry rows do not count toward warm-up volume.
    pub async fn count_sent_on_day(
        &self,
        sender_domain: &str,
        day: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM email_tracking
            WHERE sender_domain = $1
              AND sent_at::date = $2
              AND status NOT IN ('failed', 'retried')
            "#,
        )
        .bind(sender_domain)
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::RETRY_BACKOFF_MINUTES;

    #[test]
    fn test_backoff_case_mirrors_policy() {
        // The SQL CASE expression must stay in sync with the domain schedule.
        assert_eq!(RETRY_BACKOFF_MINUTES, [5, 30, 120, 360]);
        for (count, minutes) in RETRY_BACKOFF_MINUTES.iter().enumerate().take(3) {
            assert!(BACKOFF_CASE.contains(&format!("WHEN {} THEN {}", count, minutes)));
        }
        assert!(BACKOFF_CASE.contains("ELSE 360"));
    }

    #[test]
    fn test_claim_stamps_its_own_attempt_time() {
        // The claim must refresh last_attempt_at: stale release measures
        // claim age from that column, and for every backoff step past the
        // first the previous attempt is already older than the stale
        // window. An unstamped claim would be released and re-claimed by
        // an overlapping run immediately, sending the email twice.
        assert!(CLAIM_SET.contains("last_attempt_at = now()"));
        assert!(CLAIM_SET.contains("status = 'retried'"));
    }

    #[test]
    fn test_columns_cover_entity_fields() {
        for column in [
            "tracking_id",
            "order_id",
            "email_type",
            "recipient",
            "sender_domain",
            "provider_message_id",
            "tracking_token",
            "status",
            "sent_at",
            "opened_at",
            "failed_at",
            "last_attempt_at",
            "retry_count",
            "opened_count",
            "failure_reason",
            "bounce_type",
            "created_at",
        ] {
            assert!(COLUMNS.contains(column), "missing column {column}");
        }
    }
}
