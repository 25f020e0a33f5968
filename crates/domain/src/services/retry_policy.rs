//! Retry and backoff policy for failed sends.
//!
//! A failed record becomes eligible for retry once its backoff has elapsed,
//! counted from the last attempt (or the original failure when no retry has
//! run yet). After `MAX_RETRIES` failed attempts the record is forced to a
//! terminal hard bounce by the scheduler's sweep.

use chrono::{DateTime, Duration, Utc};

use crate::models::email_tracking::MAX_RETRIES;

/// Backoff schedule in minutes, indexed by the current retry count.
/// Beyond the last index the final value is reused.
pub const RETRY_BACKOFF_MINUTES: [i64; 4] = [5, 30, 120, 360];

/// Retry eligibility policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: i32,
    schedule: &'static [i64],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            schedule: &RETRY_BACKOFF_MINUTES,
        }
    }
}

impl RetryPolicy {
    /// Backoff for a record that has already failed `retry_count` times.
    pub fn backoff_minutes(&self, retry_count: i32) -> i64 {
        let index = retry_count.max(0) as usize;
        let index = index.min(self.schedule.len() - 1);
        self.schedule[index]
    }

    /// Earliest instant the next retry may run.
    ///
    /// `last_attempt_at` falls back to `failed_at` for records that have
    /// never been retried.
    pub fn next_attempt_at(
        &self,
        retry_count: i32,
        failed_at: DateTime<Utc>,
        last_attempt_at: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        let reference = last_attempt_at.unwrap_or(failed_at);
        reference + Duration::minutes(self.backoff_minutes(retry_count))
    }

    /// Whether a failed record is due for retry at `now`.
    pub fn is_due(
        &self,
        retry_count: i32,
        failed_at: DateTime<Utc>,
        last_attempt_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        !self.is_exhausted(retry_count)
            && now >= self.next_attempt_at(retry_count, failed_at, last_attempt_at)
    }

    /// Whether retries are used up; exhausted records are swept to bounced.
    pub fn is_exhausted(&self, retry_count: i32) -> bool {
        retry_count >= self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_minutes(0), 5);
        assert_eq!(policy.backoff_minutes(1), 30);
        assert_eq!(policy.backoff_minutes(2), 120);
        assert_eq!(policy.backoff_minutes(3), 360);
        // Past the end of the schedule the last value is reused.
        assert_eq!(policy.backoff_minutes(4), 360);
        assert_eq!(policy.backoff_minutes(9), 360);
    }

    #[test]
    fn test_first_retry_waits_five_minutes() {
        let policy = RetryPolicy::default();
        let failed_at = Utc::now();

        // Not due immediately after the failure.
        assert!(!policy.is_due(0, failed_at, None, failed_at));
        assert!(!policy.is_due(0, failed_at, None, failed_at + Duration::minutes(4)));
        // Due once five minutes have passed.
        assert!(policy.is_due(0, failed_at, None, failed_at + Duration::minutes(5)));
    }

    #[test]
    fn test_backoff_counts_from_last_attempt() {
        let policy = RetryPolicy::default();
        let failed_at = Utc::now() - Duration::hours(6);
        let last_attempt = Utc::now() - Duration::minutes(10);

        // retry_count = 1 means a 30 minute backoff from the last attempt,
        // regardless of how old the original failure is.
        assert!(!policy.is_due(1, failed_at, Some(last_attempt), Utc::now()));
        assert!(policy.is_due(
            1,
            failed_at,
            Some(last_attempt),
            last_attempt + Duration::minutes(30)
        ));
    }

    #[test]
    fn test_record_at_count_three_not_due_after_one_hour() {
        // Scenario: retry_count = 3, last attempt one hour ago. The 360
        // minute backoff has not elapsed, so the record is skipped and is
        // not yet exhausted (3 < 4).
        let policy = RetryPolicy::default();
        let last_attempt = Utc::now() - Duration::hours(1);
        let failed_at = last_attempt - Duration::hours(2);

        assert!(!policy.is_due(3, failed_at, Some(last_attempt), Utc::now()));
        assert!(!policy.is_exhausted(3));
    }

    #[test]
    fn test_exhaustion_at_max_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(MAX_RETRIES - 1));
        assert!(policy.is_exhausted(MAX_RETRIES));
        assert!(policy.is_exhausted(MAX_RETRIES + 1));

        // Exhausted records are never due, even long past their backoff.
        let failed_at = Utc::now() - Duration::days(2);
        assert!(!policy.is_due(MAX_RETRIES, failed_at, None, Utc::now()));
    }

    #[test]
    fn test_convergence_within_max_retries() {
        // A record failing every retry reaches exhaustion after exactly
        // MAX_RETRIES eligible attempts.
        let policy = RetryPolicy::default();
        let mut retry_count = 0;
        let mut attempts = 0;
        while !policy.is_exhausted(retry_count) {
            retry_count += 1;
            attempts += 1;
        }
        assert_eq!(attempts, MAX_RETRIES);
    }
}
