//! Warm-up schedule repository.
//!
//! The ramp curve is owned by the database (`warmup_daily_limit`); this
//! repository only reads it. Daily stats upsert on (schedule_id, stat_date)
//! so the periodic updater is idempotent per day.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{WarmupDailyStatEntity, WarmupScheduleEntity};

const SCHEDULE_COLUMNS: &str =
    "id, schedule_id, domain, start_date, current_day, daily_limit, status, created_at, updated_at";

const STAT_COLUMNS: &str = "id, schedule_id, stat_date, emails_sent, target_volume, \
     percentage_used, exceeded_limit, created_at";

/// Repository for warm-up schedules and daily stats.
pub struct WarmupRepository {
    pool: PgPool,
}

impl WarmupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_schedule(
        &self,
        domain: &str,
        start_date: NaiveDate,
    ) -> Result<WarmupScheduleEntity, sqlx::Error> {
        sqlx::query_as::<_, WarmupScheduleEntity>(&format!(
            r#"
            INSERT INTO warmup_schedules (domain, start_date, daily_limit)
            VALUES ($1, $2, warmup_daily_limit(1))
            RETURNING {SCHEDULE_COLUMNS}
            "#,
        ))
        .bind(domain)
        .bind(start_date)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_active(&self) -> Result<Vec<WarmupScheduleEntity>, sqlx::Error> {
        sqlx::query_as::<_, WarmupScheduleEntity>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM warmup_schedules
            WHERE status = 'active'
            ORDER BY start_date ASC
            "#,
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Ramp limit for a given warm-up day, from the database-side curve.
    pub async fn daily_limit(&self, day: i32) -> Result<i32, sqlx::Error> {
        let limit: (i32,) = sqlx::query_as("SELECT warmup_daily_limit($1)")
            .bind(day)
            .fetch_one(&self.pool)
            .await?;

        Ok(limit.0)
    }

    /// Idempotent upsert of one (schedule, date) stat row.
    pub async fn upsert_daily_stat(
        &self,
        schedule_id: Uuid,
        stat_date: NaiveDate,
        emails_sent: i64,
        target_volume: i32,
        percentage_used: f64,
        exceeded_limit: bool,
    ) -> Result<WarmupDailyStatEntity, sqlx::Error> {
        sqlx::query_as::<_, WarmupDailyStatEntity>(&format!(
            r#"
            INSERT INTO warmup_daily_stats
                (schedule_id, stat_date, emails_sent, target_volume, percentage_used, exceeded_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (schedule_id, stat_date) DO UPDATE
            SET emails_sent = EXCLUDED.emails_sent,
                target_volume = EXCLUDED.target_volume,
                percentage_used = EXCLUDED.percentage_used,
                exceeded_limit = EXCLUDED.exceeded_limit
            RETURNING {STAT_COLUMNS}
            "#,
        ))
        .bind(schedule_id)
        .bind(stat_date)
        .bind(emails_sent)
        .bind(target_volume)
        .bind(percentage_used)
        .bind(exceeded_limit)
        .fetch_one(&self.pool)
        .await
    }

    /// Refreshes the schedule's derived day/limit cache.
    pub async fn update_progress(
        &self,
        schedule_id: Uuid,
        current_day: i32,
        daily_limit: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE warmup_schedules
            SET current_day = $2, daily_limit = $3, updated_at = now()
            WHERE schedule_id = $1
            "#,
        )
        .bind(schedule_id)
        .bind(current_day)
        .bind(daily_limit)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Completes a schedule; only active schedules transition.
    pub async fn mark_completed(&self, schedule_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE warmup_schedules
            SET status = 'completed', updated_at = now()
            WHERE schedule_id = $1 AND status = 'active'
            "#,
        )
        .bind(schedule_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
