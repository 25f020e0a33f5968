//! On-demand job invocation endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::RetryRunResults;

#[derive(Debug, Serialize)]
pub struct RetryJobResponse {
    pub success: bool,
    pub message: String,
    pub results: RetryRunResults,
}

/// `POST /api/v1/jobs/email-retry` runs one retry pass immediately.
pub async fn run_email_retry(
    State(state): State<AppState>,
) -> Result<Json<RetryJobResponse>, ApiError> {
    let results = state.retry_runner.run_once().await?;

    let message = format!(
        "Processed {} records: {} retried, {} skipped",
        results.processed, results.retried, results.skipped
    );

    Ok(Json(RetryJobResponse {
        success: true,
        message,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let response = RetryJobResponse {
            success: true,
            message: "Processed 3 records: 1 retried, 2 skipped".to_string(),
            results: RetryRunResults {
                processed: 3,
                retried: 1,
                skipped: 2,
                succeeded: 1,
                failed: 0,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["results"]["processed"], 3);
        assert_eq!(json["results"]["succeeded"], 1);
    }
}
