//! Warm-up schedule and daily stat entity definitions.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::WarmupStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for the warmup_schedules table.
#[derive(Debug, Clone, FromRow)]
pub struct WarmupScheduleEntity {
    pub id: i64,
    pub schedule_id: Uuid,
    pub domain: String,
    pub start_date: NaiveDate,
    pub current_day: i32,
    pub daily_limit: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WarmupScheduleEntity {
    pub fn status(&self) -> Option<WarmupStatus> {
        WarmupStatus::parse(&self.status)
    }
}

/// Database entity for the warmup_daily_stats table.
#[derive(Debug, Clone, FromRow)]
pub struct WarmupDailyStatEntity {
    pub id: i64,
    pub schedule_id: Uuid,
    pub stat_date: NaiveDate,
    pub emails_sent: i64,
    pub target_volume: i32,
    pub percentage_used: f64,
    pub exceeded_limit: bool,
    pub created_at: DateTime<Utc>,
}
