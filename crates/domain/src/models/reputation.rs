//! Sender reputation and email authentication domain model.
//!
//! Pure grading logic for DNSBL results and SPF/DKIM/DMARC records; the DNS
//! lookups themselves live in the API layer's services.

use serde::{Deserialize, Serialize};

/// Overall DNSBL standing, aggregated from per-zone results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationStatus {
    Clean,
    Warning,
    Critical,
}

impl ReputationStatus {
    /// Aggregation rule: 0 listings clean, 1-2 warning, 3+ critical.
    pub fn from_listed_count(listed: usize) -> Self {
        match listed {
            0 => ReputationStatus::Clean,
            1..=2 => ReputationStatus::Warning,
            _ => ReputationStatus::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationStatus::Clean => "clean",
            ReputationStatus::Warning => "warning",
            ReputationStatus::Critical => "critical",
        }
    }
}

/// Result of checking one blacklist zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistResult {
    pub name: String,
    pub listed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Which authentication record was graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthRecordType {
    Spf,
    Dkim,
    Dmarc,
}

impl AuthRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthRecordType::Spf => "SPF",
            AuthRecordType::Dkim => "DKIM",
            AuthRecordType::Dmarc => "DMARC",
        }
    }
}

/// Grade for a single authentication record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pass,
    Warning,
    Fail,
}

/// Grade plus remediation text for one record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordGrade {
    pub status: RecordStatus,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl RecordGrade {
    fn pass() -> Self {
        Self {
            status: RecordStatus::Pass,
            issues: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn warning(issue: &str, recommendation: &str) -> Self {
        Self {
            status: RecordStatus::Warning,
            issues: vec![issue.to_string()],
            recommendations: vec![recommendation.to_string()],
        }
    }

    fn fail(issue: &str, recommendation: &str) -> Self {
        Self {
            status: RecordStatus::Fail,
            issues: vec![issue.to_string()],
            recommendations: vec![recommendation.to_string()],
        }
    }
}

/// Grades the SPF TXT records found at the domain apex.
pub fn grade_spf(records: &[String]) -> RecordGrade {
    let spf: Vec<&String> = records
        .iter()
        .filter(|r| r.trim_start().starts_with("v=spf1"))
        .collect();

    match spf.len() {
        0 => RecordGrade::fail(
            "No SPF record found",
            "Publish a TXT record starting with v=spf1 listing your sending hosts",
        ),
        1 => {
            let record = spf[0].as_str();
            if record.contains("+all") {
                RecordGrade::fail(
                    "SPF record allows all senders (+all)",
                    "Replace +all with ~all (softfail) or -all (fail)",
                )
            } else if record.contains("?all") {
                RecordGrade::warning(
                    "SPF record is neutral (?all)",
                    "Use ~all or -all so receivers can act on SPF failures",
                )
            } else if record.contains("~all") || record.contains("-all") {
                RecordGrade::pass()
            } else {
                RecordGrade::warning(
                    "SPF record has no terminal all mechanism",
                    "End the record with ~all or -all",
                )
            }
        }
        _ => RecordGrade::fail(
            "Multiple SPF records found",
            "Merge into a single v=spf1 record; multiple records fail SPF evaluation",
        ),
    }
}

/// Grades the DKIM TXT record at `<selector>._domainkey.<domain>`.
pub fn grade_dkim(records: &[String]) -> RecordGrade {
    let Some(record) = records
        .iter()
        .find(|r| r.contains("v=DKIM1") || r.contains("p="))
    else {
        return RecordGrade::fail(
            "No DKIM record found for the selector",
            "Publish the public key at <selector>._domainkey.<domain>",
        );
    };

    // An empty p= tag means the key was revoked.
    let revoked = record
        .split(';')
        .map(str::trim)
        .any(|tag| tag == "p=" || tag == "p");
    if revoked {
        return RecordGrade::fail(
            "DKIM key is revoked (empty p= tag)",
            "Publish a valid public key or remove the selector from signing",
        );
    }

    if !record.contains("p=") {
        return RecordGrade::fail(
            "DKIM record has no public key (p=) tag",
            "Include the p= tag with the base64-encoded public key",
        );
    }

    if !record.contains("v=DKIM1") {
        return RecordGrade::warning(
            "DKIM record is missing the v=DKIM1 version tag",
            "Add v=DKIM1 as the first tag for maximum compatibility",
        );
    }

    RecordGrade::pass()
}

/// Grades the DMARC TXT record at `_dmarc.<domain>`.
pub fn grade_dmarc(records: &[String]) -> RecordGrade {
    let Some(record) = records
        .iter()
        .find(|r| r.trim_start().starts_with("v=DMARC1"))
    else {
        return RecordGrade::fail(
            "No DMARC record found",
            "Publish a TXT record at _dmarc.<domain> starting with v=DMARC1",
        );
    };

    let policy = record
        .split(';')
        .map(str::trim)
        .find_map(|tag| tag.strip_prefix("p="));

    match policy {
        Some("none") => RecordGrade::warning(
            "DMARC policy is p=none (monitor only)",
            "Move to p=quarantine or p=reject once reports look clean",
        ),
        Some("quarantine") | Some("reject") => RecordGrade::pass(),
        Some(other) => RecordGrade::fail(
            &format!("DMARC policy '{}' is not valid", other),
            "Use p=none, p=quarantine, or p=reject",
        ),
        None => RecordGrade::fail(
            "DMARC record has no policy (p=) tag",
            "Add a p= tag; receivers ignore records without one",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_reputation_aggregation() {
        assert_eq!(
            ReputationStatus::from_listed_count(0),
            ReputationStatus::Clean
        );
        assert_eq!(
            ReputationStatus::from_listed_count(1),
            ReputationStatus::Warning
        );
        assert_eq!(
            ReputationStatus::from_listed_count(2),
            ReputationStatus::Warning
        );
        assert_eq!(
            ReputationStatus::from_listed_count(3),
            ReputationStatus::Critical
        );
        assert_eq!(
            ReputationStatus::from_listed_count(10),
            ReputationStatus::Critical
        );
    }

    #[test]
    fn test_auth_record_type_names() {
        assert_eq!(AuthRecordType::Spf.as_str(), "SPF");
        assert_eq!(AuthRecordType::Dkim.as_str(), "DKIM");
        assert_eq!(AuthRecordType::Dmarc.as_str(), "DMARC");
        // Serde uses the same uppercase spelling as as_str.
        assert_eq!(
            serde_json::to_value(AuthRecordType::Dmarc).unwrap(),
            "DMARC"
        );
    }

    #[test]
    fn test_spf_missing() {
        let grade = grade_spf(&records(&["some other txt"]));
        assert_eq!(grade.status, RecordStatus::Fail);
        assert!(!grade.recommendations.is_empty());
    }

    #[test]
    fn test_spf_strict_passes() {
        let grade = grade_spf(&records(&["v=spf1 include:_spf.example.com -all"]));
        assert_eq!(grade.status, RecordStatus::Pass);
        let grade = grade_spf(&records(&["v=spf1 ip4:192.0.2.0/24 ~all"]));
        assert_eq!(grade.status, RecordStatus::Pass);
    }

    #[test]
    fn test_spf_permissive_flagged() {
        assert_eq!(
            grade_spf(&records(&["v=spf1 +all"])).status,
            RecordStatus::Fail
        );
        assert_eq!(
            grade_spf(&records(&["v=spf1 include:x.com ?all"])).status,
            RecordStatus::Warning
        );
        assert_eq!(
            grade_spf(&records(&["v=spf1 include:x.com"])).status,
            RecordStatus::Warning
        );
    }

    #[test]
    fn test_spf_multiple_records_fail() {
        let grade = grade_spf(&records(&["v=spf1 -all", "v=spf1 ~all"]));
        assert_eq!(grade.status, RecordStatus::Fail);
    }

    #[test]
    fn test_dkim_grading() {
        assert_eq!(
            grade_dkim(&records(&["v=DKIM1; k=rsa; p=MIGfMA0GCSq"])).status,
            RecordStatus::Pass
        );
        assert_eq!(grade_dkim(&records(&[])).status, RecordStatus::Fail);
        // Revoked key.
        assert_eq!(
            grade_dkim(&records(&["v=DKIM1; p="])).status,
            RecordStatus::Fail
        );
        // Missing version tag is tolerated with a warning.
        assert_eq!(
            grade_dkim(&records(&["k=rsa; p=MIGfMA0GCSq"])).status,
            RecordStatus::Warning
        );
    }

    #[test]
    fn test_dmarc_grading() {
        assert_eq!(
            grade_dmarc(&records(&["v=DMARC1; p=reject; rua=mailto:d@example.com"])).status,
            RecordStatus::Pass
        );
        assert_eq!(
            grade_dmarc(&records(&["v=DMARC1; p=quarantine"])).status,
            RecordStatus::Pass
        );
        assert_eq!(
            grade_dmarc(&records(&["v=DMARC1; p=none"])).status,
            RecordStatus::Warning
        );
        assert_eq!(grade_dmarc(&records(&[])).status, RecordStatus::Fail);
        assert_eq!(
            grade_dmarc(&records(&["v=DMARC1; rua=mailto:d@example.com"])).status,
            RecordStatus::Fail
        );
    }
}
