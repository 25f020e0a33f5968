//! SPF/DKIM/DMARC authentication checker.
//!
//! Resolves the three TXT locations for a sending domain and grades each
//! record with the domain-layer rules. Lookups fail open: an unreachable
//! resolver grades as a missing record rather than an error.

use crate::services::dns::{apply_policy, CheckedResolver, ErrorPolicy};
use crate::services::notifier::Notifier;
use chrono::{DateTime, Utc};
use domain::models::notification::NewNotification;
use domain::models::reputation::{
    grade_dkim, grade_dmarc, grade_spf, AuthRecordType, RecordGrade, RecordStatus,
};
use domain::models::NotificationSeverity;
use tracing::{info, warn};

/// Default DKIM selector when the caller does not name one.
pub const DEFAULT_DKIM_SELECTOR: &str = "default";

/// One graded record with the raw TXT value that was graded.
#[derive(Debug, Clone)]
pub struct CheckedRecord {
    pub record: Option<String>,
    pub grade: RecordGrade,
}

/// Full authentication report for a domain.
#[derive(Debug, Clone)]
pub struct AuthReport {
    pub domain: String,
    pub dkim_selector: String,
    pub spf: CheckedRecord,
    pub dkim: CheckedRecord,
    pub dmarc: CheckedRecord,
    pub checked_at: DateTime<Utc>,
}

impl AuthReport {
    /// Number of records graded as failing.
    pub fn critical_issues(&self) -> usize {
        [&self.spf, &self.dkim, &self.dmarc]
            .iter()
            .filter(|r| r.grade.status == RecordStatus::Fail)
            .count()
    }
}

/// Grades a domain's SPF, DKIM, and DMARC configuration.
pub struct AuthenticationChecker {
    resolver: CheckedResolver,
    policy: ErrorPolicy,
}

impl AuthenticationChecker {
    pub fn new(resolver: CheckedResolver) -> Self {
        Self {
            resolver,
            policy: ErrorPolicy::FailOpen,
        }
    }

    /// Runs the check. Failing records raise a deduplicated admin alert.
    pub async fn check(
        &self,
        domain: &str,
        dkim_selector: Option<&str>,
        notifier: &Notifier,
    ) -> Result<AuthReport, sqlx::Error> {
        let selector = dkim_selector.unwrap_or(DEFAULT_DKIM_SELECTOR);

        let apex = self.lookup_txt(domain).await;
        let dkim_records = self
            .lookup_txt(&format!("{}._domainkey.{}", selector, domain))
            .await;
        let dmarc_records = self.lookup_txt(&format!("_dmarc.{}", domain)).await;

        let spf_grade = grade_spf(&apex);
        let dkim_grade = grade_dkim(&dkim_records);
        let dmarc_grade = grade_dmarc(&dmarc_records);

        let report = AuthReport {
            domain: domain.to_string(),
            dkim_selector: selector.to_string(),
            spf: CheckedRecord {
                record: apex.iter().find(|r| r.starts_with("v=spf1")).cloned(),
                grade: spf_grade,
            },
            dkim: CheckedRecord {
                record: dkim_records.first().cloned(),
                grade: dkim_grade,
            },
            dmarc: CheckedRecord {
                record: dmarc_records
                    .iter()
                    .find(|r| r.starts_with("v=DMARC1"))
                    .cloned(),
                grade: dmarc_grade,
            },
            checked_at: Utc::now(),
        };

        let critical = report.critical_issues();
        info!(
            domain = %domain,
            selector = %selector,
            critical_issues = critical,
            "Authentication check complete"
        );

        if critical > 0 {
            let failing: Vec<&str> = [
                (AuthRecordType::Spf, &report.spf),
                (AuthRecordType::Dkim, &report.dkim),
                (AuthRecordType::Dmarc, &report.dmarc),
            ]
            .iter()
            .filter(|(_, r)| r.grade.status == RecordStatus::Fail)
            .map(|(record_type, _)| record_type.as_str())
            .collect();

            notifier
                .notify(
                    NewNotification::new(
                        "auth_failure",
                        NotificationSeverity::Critical,
                        format!("Email authentication failing for {}", domain),
                        format!("{} record(s) failing: {}", critical, failing.join(", ")),
                    )
                    .with_dedup_key(format!("auth_failure:{}", domain))
                    .with_data(serde_json::json!({
                        "domain": domain,
                        "failing": failing,
                    })),
                )
                .await?;
        }

        Ok(report)
    }

    async fn lookup_txt(&self, name: &str) -> Vec<String> {
        let lookup = self.resolver.txt_records(name).await;
        if let Err(err) = &lookup {
            warn!(name = %name, error = %err, "TXT lookup failed");
        }
        apply_policy(self.policy, Vec::new(), lookup).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::reputation::RecordStatus;

    fn record(value: Option<&str>, status: RecordStatus) -> CheckedRecord {
        CheckedRecord {
            record: value.map(String::from),
            grade: RecordGrade {
                status,
                issues: Vec::new(),
                recommendations: Vec::new(),
            },
        }
    }

    #[test]
    fn test_critical_issues_counts_fails_only() {
        let report = AuthReport {
            domain: "example.com".to_string(),
            dkim_selector: "default".to_string(),
            spf: record(Some("v=spf1 -all"), RecordStatus::Pass),
            dkim: record(None, RecordStatus::Fail),
            dmarc: record(Some("v=DMARC1; p=none"), RecordStatus::Warning),
            checked_at: Utc::now(),
        };

        assert_eq!(report.critical_issues(), 1);
    }

    #[test]
    fn test_critical_issues_zero_when_all_pass() {
        let report = AuthReport {
            domain: "example.com".to_string(),
            dkim_selector: "s1".to_string(),
            spf: record(Some("v=spf1 -all"), RecordStatus::Pass),
            dkim: record(Some("v=DKIM1; p=abc"), RecordStatus::Pass),
            dmarc: record(Some("v=DMARC1; p=reject"), RecordStatus::Pass),
            checked_at: Utc::now(),
        };

        assert_eq!(report.critical_issues(), 0);
    }
}
