//! Warm-up stats updater.
//!
//! For each active schedule: compute the warm-up day, count emails sent for
//! the domain today, upsert the day's stat row, alert on overage, and
//! complete the schedule once the 35-day ramp finishes cleanly.

use crate::services::notifier::Notifier;
use chrono::{NaiveDate, Utc};
use domain::models::notification::NewNotification;
use domain::models::warmup::{days_elapsed, is_ramp_complete, percentage_used};
use domain::models::NotificationSeverity;
use persistence::repositories::{EmailTrackingRepository, WarmupRepository};
use tracing::{info, warn};

/// Per-schedule outcome of one updater pass.
#[derive(Debug, Clone, Default)]
pub struct WarmupPassSummary {
    pub schedules_updated: u64,
    pub schedules_completed: u64,
    pub overages: u64,
}

/// Updates warm-up daily stats for active schedules.
pub struct WarmupUpdater {
    warmup: WarmupRepository,
    tracking: EmailTrackingRepository,
}

impl WarmupUpdater {
    pub fn new(warmup: WarmupRepository, tracking: EmailTrackingRepository) -> Self {
        Self { warmup, tracking }
    }

    /// Runs one pass over all active schedules.
    pub async fn run_once(&self, notifier: &Notifier) -> Result<WarmupPassSummary, sqlx::Error> {
        let today = Utc::now().date_naive();
        let schedules = self.warmup.find_active().await?;
        let mut summary = WarmupPassSummary::default();

        for schedule in schedules {
            let day = days_elapsed(schedule.start_date, today);
            let target = self.warmup.daily_limit(day).await?;
            let sent = self
                .tracking
                .count_sent_on_day(&schedule.domain, today)
                .await?;

            let pct = percentage_used(sent, target);
            let exceeded = sent > i64::from(target);

            self.warmup
                .upsert_daily_stat(schedule.schedule_id, today, sent, target, pct, exceeded)
                .await?;
            self.warmup
                .update_progress(schedule.schedule_id, day, target)
                .await?;
            summary.schedules_updated += 1;

            if exceeded {
                summary.overages += 1;
                warn!(
                    domain = %schedule.domain,
                    day,
                    sent,
                    target,
                    "Warm-up daily limit exceeded"
                );
                self.notify_overage(notifier, &schedule.domain, day, sent, target, today)
                    .await?;
            }

            if is_ramp_complete(day, exceeded) {
                let completed = self.warmup.mark_completed(schedule.schedule_id).await?;
                if completed {
                    summary.schedules_completed += 1;
                    info!(domain = %schedule.domain, day, "Warm-up ramp completed");
                    notifier
                        .notify(
                            NewNotification::new(
                                "warmup_complete",
                                NotificationSeverity::Info,
                                format!("Warm-up complete for {}", schedule.domain),
                                format!(
                                    "{} finished its {}-day warm-up ramp",
                                    schedule.domain,
                                    domain::models::WARMUP_PERIOD_DAYS
                                ),
                            )
                            .with_dedup_key(format!("warmup_complete:{}", schedule.domain)),
                        )
                        .await?;
                }
            }
        }

        info!(
            updated = summary.schedules_updated,
            completed = summary.schedules_completed,
            overages = summary.overages,
            "Warm-up pass complete"
        );

        Ok(summary)
    }

    async fn notify_overage(
        &self,
        notifier: &Notifier,
        domain: &str,
        day: i32,
        sent: i64,
        target: i32,
        today: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        notifier
            .notify(
                NewNotification::new(
                    "warmup_overage",
                    NotificationSeverity::Warning,
                    format!("Warm-up limit exceeded for {}", domain),
                    format!(
                        "{} sent {} emails on day {} (limit {})",
                        domain, sent, day, target
                    ),
                )
                // One overage alert per domain per calendar day.
                .with_dedup_key(format!("warmup_overage:{}:{}", domain, today))
                .with_data(serde_json::json!({
                    "domain": domain,
                    "day": day,
                    "sent": sent,
                    "target": target,
                })),
            )
            .await?;

        Ok(())
    }
}
