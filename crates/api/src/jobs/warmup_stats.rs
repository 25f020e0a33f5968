//! Warm-up stats background job.

use std::sync::Arc;
use tracing::info;

use crate::services::{Notifier, WarmupUpdater};

use super::scheduler::{Job, JobFrequency};

/// Background job that refreshes warm-up daily stats for active schedules.
pub struct WarmupStatsJob {
    updater: Arc<WarmupUpdater>,
    notifier: Arc<Notifier>,
    interval_minutes: u64,
}

impl WarmupStatsJob {
    pub fn new(updater: Arc<WarmupUpdater>, notifier: Arc<Notifier>, interval_minutes: u64) -> Self {
        Self {
            updater,
            notifier,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for WarmupStatsJob {
    fn name(&self) -> &'static str {
        "warmup_stats"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let summary = self
            .updater
            .run_once(&self.notifier)
            .await
            .map_err(|e| format!("Warm-up pass failed: {}", e))?;

        if summary.schedules_updated > 0 {
            info!(
                updated = summary.schedules_updated,
                completed = summary.schedules_completed,
                overages = summary.overages,
                "Warm-up stats refreshed"
            );
        }

        Ok(())
    }
}
