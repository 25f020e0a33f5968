//! Warm-up schedule management endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use persistence::repositories::WarmupRepository;
use shared::validation::is_valid_domain;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub domain: String,
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule_id: uuid::Uuid,
    pub domain: String,
    pub start_date: NaiveDate,
    pub current_day: i32,
    pub daily_limit: i32,
    pub status: String,
}

/// `POST /api/v1/warmup/schedules` starts a warm-up ramp for a domain.
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), ApiError> {
    if !is_valid_domain(&request.domain) {
        return Err(ApiError::Validation(format!(
            "Invalid domain: {}",
            request.domain
        )));
    }

    let start_date = request.start_date.unwrap_or_else(|| Utc::now().date_naive());

    let repository = WarmupRepository::new(state.pool.clone());
    let schedule = repository.create_schedule(&request.domain, start_date).await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduleResponse {
            schedule_id: schedule.schedule_id,
            domain: schedule.domain,
            start_date: schedule.start_date,
            current_day: schedule.current_day,
            daily_limit: schedule.daily_limit,
            status: schedule.status,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_start_date_optional() {
        let request: CreateScheduleRequest =
            serde_json::from_str(r#"{"domain": "mail.example.com"}"#).unwrap();
        assert!(request.start_date.is_none());
    }

    #[test]
    fn test_create_request_parses_date() {
        let request: CreateScheduleRequest =
            serde_json::from_str(r#"{"domain": "mail.example.com", "startDate": "2026-08-01"}"#)
                .unwrap();
        assert_eq!(
            request.start_date,
            Some(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())
        );
    }
}
