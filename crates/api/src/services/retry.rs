//! Retry scheduler pass.
//!
//! Claims due failed records, resends them with per-item pacing, then runs
//! the exhaustion sweep so records past the retry cap converge to a terminal
//! hard bounce even when they were skipped this cycle.

use crate::config::RetryConfig;
use crate::middleware::metrics::record_retry_outcomes;
use crate::services::email::EmailService;
use persistence::repositories::EmailTrackingRepository;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome counts for one retry pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryRunResults {
    /// Records considered this pass (claimed plus not-yet-due).
    pub processed: u64,
    /// Records claimed and actually resent.
    pub retried: u64,
    /// Records still inside their backoff window.
    pub skipped: u64,
    /// Resends the provider accepted.
    pub succeeded: u64,
    /// Resends that failed again.
    pub failed: u64,
}

/// Runs one pass of the retry scheduler.
pub struct RetryRunner {
    tracking: EmailTrackingRepository,
    email: EmailService,
    config: RetryConfig,
}

impl RetryRunner {
    pub fn new(tracking: EmailTrackingRepository, email: EmailService, config: RetryConfig) -> Self {
        Self {
            tracking,
            email,
            config,
        }
    }

    /// Executes one full pass: release stale claims, claim due records,
    /// resend each with pacing, then sweep exhausted records.
    pub async fn run_once(&self) -> Result<RetryRunResults, sqlx::Error> {
        let released = self
            .tracking
            .release_stale_claims(self.config.stale_claim_minutes)
            .await?;
        if released > 0 {
            warn!(released, "Released stale retry claims");
        }

        let claimed = self.tracking.claim_due_retries(self.config.batch_size).await?;
        let skipped = self.tracking.count_failed_not_due().await? as u64;

        let mut results = RetryRunResults {
            processed: claimed.len() as u64 + skipped,
            retried: claimed.len() as u64,
            skipped,
            ..Default::default()
        };

        for (i, record) in claimed.iter().enumerate() {
            // Fixed pause between consecutive sends, not before the first.
            if i > 0 && self.config.pacing_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.pacing_ms)).await;
            }

            match self.email.resend(record).await {
                Ok(outcome) => {
                    let completed = self
                        .tracking
                        .complete_retry_success(
                            record.tracking_id,
                            outcome.provider_message_id.as_deref(),
                        )
                        .await?;
                    if !completed {
                        warn!(
                            tracking_id = %record.tracking_id,
                            "Retry claim was lost before completion; attempt not counted"
                        );
                    }
                    results.succeeded += 1;
                    info!(
                        tracking_id = %record.tracking_id,
                        recipient = %record.recipient,
                        retry_count = record.retry_count + 1,
                        "Retry send succeeded"
                    );
                }
                Err(err) => {
                    let completed = self
                        .tracking
                        .complete_retry_failure(record.tracking_id, &err.to_string())
                        .await?;
                    if !completed {
                        warn!(
                            tracking_id = %record.tracking_id,
                            "Retry claim was lost before completion; attempt not counted"
                        );
                    }
                    results.failed += 1;
                    warn!(
                        tracking_id = %record.tracking_id,
                        recipient = %record.recipient,
                        retry_count = record.retry_count + 1,
                        error = %err,
                        "Retry send failed"
                    );
                }
            }
        }

        let swept = self.tracking.sweep_exhausted().await?;
        if swept > 0 {
            info!(swept, "Exhausted records forced to hard bounce");
        }

        record_retry_outcomes(results.succeeded, results.failed);

        info!(
            processed = results.processed,
            retried = results.retried,
            skipped = results.skipped,
            succeeded = results.succeeded,
            failed = results.failed,
            "Retry pass complete"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_serialize_shape() {
        let results = RetryRunResults {
            processed: 5,
            retried: 3,
            skipped: 2,
            succeeded: 2,
            failed: 1,
        };

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["processed"], 5);
        assert_eq!(json["retried"], 3);
        assert_eq!(json["skipped"], 2);
        assert_eq!(json["succeeded"], 2);
        assert_eq!(json["failed"], 1);
    }

    #[test]
    fn test_results_default_is_zeroed() {
        let results = RetryRunResults::default();
        assert_eq!(results.processed, 0);
        assert_eq!(results.succeeded, 0);
        assert_eq!(results.failed, 0);
    }
}
