//! Email retry background job.
//!
//! Periodically runs a retry pass; the same pass is exposed on demand via
//! the jobs route. All claiming and convergence logic lives in the runner.

use std::sync::Arc;
use tracing::info;

use crate::services::RetryRunner;

use super::scheduler::{Job, JobFrequency};

/// Background job that retries failed email sends on a backoff schedule.
pub struct EmailRetryJob {
    runner: Arc<RetryRunner>,
    interval_minutes: u64,
}

impl EmailRetryJob {
    pub fn new(runner: Arc<RetryRunner>, interval_minutes: u64) -> Self {
        Self {
            runner,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for EmailRetryJob {
    fn name(&self) -> &'static str {
        "email_retry"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let results = self
            .runner
            .run_once()
            .await
            .map_err(|e| format!("Retry pass failed: {}", e))?;

        if results.retried > 0 {
            info!(
                retried = results.retried,
                succeeded = results.succeeded,
                failed = results.failed,
                "Scheduled retry pass finished"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_frequency_follows_config() {
        let freq = JobFrequency::Minutes(5);
        assert_eq!(freq.duration(), Duration::from_secs(300));
    }
}
