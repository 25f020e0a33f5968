//! DNSBL reputation checker.
//!
//! Queries a fixed set of public blacklist zones for a sending domain or
//! IPv4 address. Lookups run sequentially per zone and fail open: a broken
//! resolver reads as "not listed" rather than failing the check.

use crate::middleware::metrics::record_dnsbl_listing;
use crate::services::dns::{apply_policy, CheckedResolver, ErrorPolicy};
use crate::services::notifier::Notifier;
use chrono::{DateTime, Utc};
use domain::models::notification::NewNotification;
use domain::models::reputation::{BlacklistResult, ReputationStatus};
use domain::models::NotificationSeverity;
use shared::validation::parse_ipv4;
use tracing::{info, warn};

/// Blacklist zones checked, in query order.
const DNSBL_ZONES: &[&str] = &[
    "zen.spamhaus.org",
    "bl.spamcop.net",
    "b.barracudacentral.org",
    "dnsbl.sorbs.net",
    "psbl.surriel.com",
    "spam.dnsbl.anonmails.de",
    "ubl.unsubscore.com",
    "dnsbl-1.uceprotect.net",
    "backscatter.org",
    "multi.surbl.org",
];

/// Aggregated result of one blacklist check.
#[derive(Debug, Clone)]
pub struct BlacklistReport {
    pub target: String,
    pub results: Vec<BlacklistResult>,
    pub listed_count: usize,
    pub total_checked: usize,
    pub status: ReputationStatus,
    pub checked_at: DateTime<Utc>,
}

/// Checks a domain or IP against the configured DNSBL zones.
pub struct BlacklistChecker {
    resolver: CheckedResolver,
    policy: ErrorPolicy,
}

impl BlacklistChecker {
    pub fn new(resolver: CheckedResolver) -> Self {
        Self {
            resolver,
            policy: ErrorPolicy::FailOpen,
        }
    }

    /// Runs the check. Any listing raises a critical admin alert,
    /// deduplicated per target.
    pub async fn check(
        &self,
        target: &str,
        notifier: &Notifier,
    ) -> Result<BlacklistReport, sqlx::Error> {
        let mut results = Vec::with_capacity(DNSBL_ZONES.len());
        let mut listed_count = 0;

        for zone in DNSBL_ZONES {
            let query = query_name(target, zone);

            let lookup = self.resolver.has_a_record(&query).await;
            if let Err(err) = &lookup {
                warn!(zone = %zone, target = %target, error = %err, "DNSBL lookup failed");
            }
            // A lookup failure cannot report a listing.
            let listed = match apply_policy(self.policy, false, lookup) {
                Ok(listed) => listed,
                Err(_) => false,
            };

            let details = if listed {
                listed_count += 1;
                record_dnsbl_listing(zone);
                let txt = self.resolver.txt_records(&query).await;
                apply_policy(self.policy, Vec::new(), txt)
                    .ok()
                    .and_then(|records| records.into_iter().next())
            } else {
                None
            };

            results.push(BlacklistResult {
                name: zone.to_string(),
                listed,
                details,
            });
        }

        let status = ReputationStatus::from_listed_count(listed_count);
        let report = BlacklistReport {
            target: target.to_string(),
            results,
            listed_count,
            total_checked: DNSBL_ZONES.len(),
            status,
            checked_at: Utc::now(),
        };

        info!(
            target = %target,
            listed = listed_count,
            checked = report.total_checked,
            status = %status.as_str(),
            "Blacklist check complete"
        );

        if listed_count > 0 {
            notifier.notify(listing_alert(&report)).await?;
        }

        Ok(report)
    }
}

/// Alert for a listed target. Always critical: a single listing already
/// hurts deliverability, even when the aggregated status is only warning.
fn listing_alert(report: &BlacklistReport) -> NewNotification {
    let zones: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.listed)
        .map(|r| r.name.as_str())
        .collect();

    NewNotification::new(
        "blacklist_alert",
        NotificationSeverity::Critical,
        format!("{} is blacklisted", report.target),
        format!(
            "{} is listed on {} of {} blacklists: {}",
            report.target,
            report.listed_count,
            report.total_checked,
            zones.join(", ")
        ),
    )
    .with_dedup_key(format!("blacklist_alert:{}", report.target))
    .with_data(serde_json::json!({
        "target": report.target,
        "listed": zones,
    }))
}

/// DNSBL query name for a target in a zone: reversed octets for IPv4
/// addresses, the bare name for domains.
fn query_name(target: &str, zone: &str) -> String {
    match parse_ipv4(target) {
        Some(octets) => format!(
            "{}.{}.{}.{}.{}",
            octets[3], octets[2], octets[1], octets[0], zone
        ),
        None => format!("{}.{}", target, zone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_name_reverses_ip_octets() {
        assert_eq!(
            query_name("203.0.113.7", "zen.spamhaus.org"),
            "7.113.0.203.zen.spamhaus.org"
        );
    }

    #[test]
    fn test_query_name_domain_prepended() {
        assert_eq!(
            query_name("example.com", "bl.spamcop.net"),
            "example.com.bl.spamcop.net"
        );
    }

    #[test]
    fn test_single_listing_alert_is_critical() {
        // One listing keeps the aggregated status at warning, but the
        // alert itself is critical.
        let report = BlacklistReport {
            target: "example.com".to_string(),
            results: vec![BlacklistResult {
                name: "bl.spamcop.net".to_string(),
                listed: true,
                details: None,
            }],
            listed_count: 1,
            total_checked: 10,
            status: ReputationStatus::Warning,
            checked_at: Utc::now(),
        };

        let alert = listing_alert(&report);
        assert_eq!(alert.severity, NotificationSeverity::Critical);
        assert_eq!(alert.dedup_key, "blacklist_alert:example.com");
        assert!(alert.message.contains("1 of 10"));
    }

    #[test]
    fn test_zone_list_has_no_duplicates() {
        let mut zones: Vec<&str> = DNSBL_ZONES.to_vec();
        zones.sort_unstable();
        zones.dedup();
        assert_eq!(zones.len(), DNSBL_ZONES.len());
    }
}
