//! Warm-up schedule domain model.
//!
//! A warm-up schedule ramps a new sending domain's daily volume over a fixed
//! period to build sender reputation. The ramp curve itself lives in the
//! database (`warmup_daily_limit(day)`); this module only carries the
//! day-counting and completion rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the warm-up ramp in days.
pub const WARMUP_PERIOD_DAYS: i32 = 35;

/// Warm-up schedule status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupStatus {
    Active,
    Completed,
}

impl WarmupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarmupStatus::Active => "active",
            WarmupStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(WarmupStatus::Active),
            "completed" => Some(WarmupStatus::Completed),
            _ => None,
        }
    }
}

/// One sending domain under ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WarmupSchedule {
    pub schedule_id: Uuid,
    pub domain: String,
    pub start_date: NaiveDate,
    /// Derived cache; `days_elapsed` is authoritative.
    pub current_day: i32,
    /// Derived cache of the ramp limit for `current_day`.
    pub daily_limit: i32,
    pub status: WarmupStatus,
    pub created_at: DateTime<Utc>,
}

/// Volume stats for one (schedule, date) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WarmupDailyStat {
    pub schedule_id: Uuid,
    pub stat_date: NaiveDate,
    pub emails_sent: i64,
    pub target_volume: i32,
    pub percentage_used: f64,
    pub exceeded_limit: bool,
}

/// Day number within the ramp: day 1 on the start date.
///
/// Dates before the start clamp to day 1 rather than going negative.
pub fn days_elapsed(start_date: NaiveDate, today: NaiveDate) -> i32 {
    let elapsed = (today - start_date).num_days() as i32 + 1;
    elapsed.max(1)
}

/// Completion gate: the ramp period has passed AND the most recent day
/// stayed within its limit. A day-35 overage keeps the schedule active.
pub fn is_ramp_complete(days_elapsed: i32, latest_day_exceeded: bool) -> bool {
    days_elapsed >= WARMUP_PERIOD_DAYS && !latest_day_exceeded
}

/// Percentage of the daily limit consumed, saturating at zero limit.
pub fn percentage_used(emails_sent: i64, target_volume: i32) -> f64 {
    if target_volume <= 0 {
        return if emails_sent > 0 { 100.0 } else { 0.0 };
    }
    (emails_sent as f64 / target_volume as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_elapsed_counts_from_one() {
        let start = date(2026, 8, 1);
        assert_eq!(days_elapsed(start, start), 1);
        assert_eq!(days_elapsed(start, date(2026, 8, 2)), 2);
        assert_eq!(days_elapsed(start, date(2026, 9, 4)), 35);
    }

    #[test]
    fn test_days_elapsed_clamps_before_start() {
        let start = date(2026, 8, 10);
        assert_eq!(days_elapsed(start, date(2026, 8, 5)), 1);
    }

    #[test]
    fn test_ramp_completion_gate() {
        // Day 35 within limit: complete.
        assert!(is_ramp_complete(35, false));
        assert!(is_ramp_complete(40, false));
        // Day 35 but exceeded: stays active.
        assert!(!is_ramp_complete(35, true));
        // Not yet at the end of the ramp.
        assert!(!is_ramp_complete(34, false));
    }

    #[test]
    fn test_percentage_used() {
        assert_eq!(percentage_used(50, 100), 50.0);
        assert_eq!(percentage_used(150, 100), 150.0);
        assert_eq!(percentage_used(0, 100), 0.0);
        // Degenerate zero limit.
        assert_eq!(percentage_used(0, 0), 0.0);
        assert_eq!(percentage_used(10, 0), 100.0);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(WarmupStatus::parse("active"), Some(WarmupStatus::Active));
        assert_eq!(
            WarmupStatus::parse("completed"),
            Some(WarmupStatus::Completed)
        );
        assert_eq!(WarmupStatus::parse("paused"), None);
    }
}
