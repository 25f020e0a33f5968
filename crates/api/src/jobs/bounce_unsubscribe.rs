//! Bounce-threshold unsubscriber job.
//!
//! Aggregates bounce counts per recipient and unsubscribes addresses at or
//! over the threshold, plus recipients hard-bounced in the last day. This
//! path is independent of the retry scheduler's per-record exhaustion: a
//! recipient can cross the threshold across several distinct emails that
//! each bounced only once.

use chrono::{Duration as ChronoDuration, Utc};
use domain::models::notification::NewNotification;
use domain::models::NotificationSeverity;
use persistence::repositories::{EmailTrackingRepository, NotificationRepository, PricingGuideRepository};
use sqlx::PgPool;
use std::collections::BTreeSet;
use tracing::info;

use crate::services::Notifier;

use super::scheduler::{Job, JobFrequency};

/// Background job that auto-unsubscribes repeatedly bouncing recipients.
pub struct BounceUnsubscribeJob {
    pool: PgPool,
    threshold: i64,
    interval_minutes: u64,
}

impl BounceUnsubscribeJob {
    pub fn new(pool: PgPool, threshold: i64, interval_minutes: u64) -> Self {
        Self {
            pool,
            threshold,
            interval_minutes,
        }
    }

    async fn run(&self) -> Result<u64, sqlx::Error> {
        let tracking = EmailTrackingRepository::new(self.pool.clone());
        let pricing_guide = PricingGuideRepository::new(self.pool.clone());
        let notifier = Notifier::new(NotificationRepository::new(self.pool.clone()));

        // Union of the two candidate sets, deduplicated.
        let mut candidates = BTreeSet::new();
        for entry in tracking
            .recipients_over_bounce_threshold(self.threshold)
            .await?
        {
            candidates.insert(entry.recipient);
        }
        let since = Utc::now() - ChronoDuration::hours(24);
        for recipient in tracking.hard_bounce_recipients_since(since).await? {
            candidates.insert(recipient);
        }

        let mut flipped = Vec::new();
        for recipient in &candidates {
            if pricing_guide.unsubscribe(recipient).await? > 0 {
                flipped.push(recipient.clone());
            }
        }

        if !flipped.is_empty() {
            info!(
                count = flipped.len(),
                threshold = self.threshold,
                "Recipients auto-unsubscribed over bounce threshold"
            );

            let today = Utc::now().date_naive();
            notifier
                .notify(
                    NewNotification::new(
                        "bounce_threshold_unsubscribe",
                        NotificationSeverity::Info,
                        "Recipients auto-unsubscribed",
                        format!(
                            "{} recipient(s) unsubscribed after repeated bounces: {}",
                            flipped.len(),
                            flipped.join(", ")
                        ),
                    )
                    .with_dedup_key(format!("bounce_threshold_unsubscribe:{}", today))
                    .with_data(serde_json::json!({ "recipients": flipped })),
                )
                .await?;
        }

        Ok(flipped.len() as u64)
    }
}

#[async_trait::async_trait]
impl Job for BounceUnsubscribeJob {
    fn name(&self) -> &'static str {
        "bounce_unsubscribe"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        self.run()
            .await
            .map_err(|e| format!("Bounce unsubscriber pass failed: {}", e))?;
        Ok(())
    }
}
