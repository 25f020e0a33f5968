//! On-demand reputation and authentication check endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{AuthenticationChecker, BlacklistChecker, Notifier};
use domain::models::reputation::{AuthRecordType, BlacklistResult, RecordStatus, ReputationStatus};
use persistence::repositories::NotificationRepository;
use shared::validation::{is_valid_domain, parse_ipv4};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistRequest {
    pub domain: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistResponse {
    pub status: ReputationStatus,
    pub listed_count: usize,
    pub total_checked: usize,
    pub results: Vec<BlacklistResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// `POST /api/v1/reputation/blacklist`
pub async fn check_blacklist(
    State(state): State<AppState>,
    Json(request): Json<BlacklistRequest>,
) -> Result<Json<BlacklistResponse>, ApiError> {
    let target = match (&request.domain, &request.ip_address) {
        (Some(domain), _) if is_valid_domain(domain) => domain.clone(),
        (Some(domain), _) => {
            return Err(ApiError::Validation(format!("Invalid domain: {}", domain)))
        }
        (None, Some(ip)) if parse_ipv4(ip).is_some() => ip.clone(),
        (None, Some(ip)) => {
            return Err(ApiError::Validation(format!("Invalid IPv4 address: {}", ip)))
        }
        (None, None) => {
            return Err(ApiError::Validation(
                "Either domain or ipAddress is required".into(),
            ))
        }
    };

    let checker = BlacklistChecker::new(state.resolver.clone());
    let notifier = Notifier::new(NotificationRepository::new(state.pool.clone()));
    let report = checker.check(&target, &notifier).await?;

    Ok(Json(BlacklistResponse {
        status: report.status,
        listed_count: report.listed_count,
        total_checked: report.total_checked,
        results: report.results,
        domain: request.domain,
        ip_address: request.ip_address,
        checked_at: report.checked_at,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest {
    pub domain: String,
    pub dkim_selector: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecordResult {
    #[serde(rename = "type")]
    pub record_type: AuthRecordType,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub status: RecordStatus,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub status: RecordStatus,
    pub critical_issues: usize,
    pub results: Vec<AuthRecordResult>,
    pub domain: String,
    pub dkim_selector: String,
    pub checked_at: DateTime<Utc>,
}

/// `POST /api/v1/reputation/authentication`
pub async fn check_authentication(
    State(state): State<AppState>,
    Json(request): Json<AuthenticationRequest>,
) -> Result<Json<AuthenticationResponse>, ApiError> {
    if !is_valid_domain(&request.domain) {
        return Err(ApiError::Validation(format!(
            "Invalid domain: {}",
            request.domain
        )));
    }

    let checker = AuthenticationChecker::new(state.resolver.clone());
    let notifier = Notifier::new(NotificationRepository::new(state.pool.clone()));
    let report = checker
        .check(&request.domain, request.dkim_selector.as_deref(), &notifier)
        .await?;

    let results: Vec<AuthRecordResult> = [
        (AuthRecordType::Spf, &report.spf),
        (AuthRecordType::Dkim, &report.dkim),
        (AuthRecordType::Dmarc, &report.dmarc),
    ]
    .into_iter()
    .map(|(record_type, checked)| AuthRecordResult {
        record_type,
        found: checked.record.is_some(),
        value: checked.record.clone(),
        status: checked.grade.status,
        issues: checked.grade.issues.clone(),
        recommendations: checked.grade.recommendations.clone(),
    })
    .collect();

    // Overall status is the worst individual grade.
    let status = results
        .iter()
        .map(|r| r.status)
        .max_by_key(|s| match s {
            RecordStatus::Pass => 0,
            RecordStatus::Warning => 1,
            RecordStatus::Fail => 2,
        })
        .unwrap_or(RecordStatus::Pass);

    Ok(Json(AuthenticationResponse {
        status,
        critical_issues: report.critical_issues(),
        results,
        domain: report.domain,
        dkim_selector: report.dkim_selector,
        checked_at: report.checked_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_request_camel_case() {
        let request: BlacklistRequest =
            serde_json::from_str(r#"{"ipAddress": "203.0.113.7"}"#).unwrap();
        assert_eq!(request.ip_address.as_deref(), Some("203.0.113.7"));
        assert!(request.domain.is_none());
    }

    #[test]
    fn test_blacklist_response_camel_case() {
        let response = BlacklistResponse {
            status: ReputationStatus::Warning,
            listed_count: 1,
            total_checked: 10,
            results: vec![],
            domain: Some("example.com".to_string()),
            ip_address: None,
            checked_at: Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["listedCount"], 1);
        assert_eq!(json["totalChecked"], 10);
        assert!(json.get("checkedAt").is_some());
        assert!(json.get("ipAddress").is_none());
    }

    #[test]
    fn test_auth_record_result_type_field() {
        let result = AuthRecordResult {
            record_type: AuthRecordType::Spf,
            found: true,
            value: Some("v=spf1 -all".to_string()),
            status: RecordStatus::Pass,
            issues: vec![],
            recommendations: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "SPF");
        assert_eq!(json["found"], true);

        let result = AuthRecordResult {
            record_type: AuthRecordType::Dmarc,
            found: false,
            value: None,
            status: RecordStatus::Fail,
            issues: vec!["No DMARC record found".to_string()],
            recommendations: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "DMARC");
    }

    #[test]
    fn test_auth_request_selector_optional() {
        let request: AuthenticationRequest =
            serde_json::from_str(r#"{"domain": "example.com"}"#).unwrap();
        assert!(request.dkim_selector.is_none());
    }
}
