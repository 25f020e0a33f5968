//! Open tracking pixel and unsubscribe endpoints.
//!
//! The pixel responds with a valid image unconditionally: missing tokens,
//! unknown tokens, and database errors all still get the GIF. Tracking
//! updates run first but their outcome never touches the response.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_open_tracked;
use crate::services::unsubscribe::UnsubscribeOutcome;
use crate::services::UnsubscribeService;
use persistence::repositories::{EmailTrackingRepository, PricingGuideRepository};

/// 1x1 transparent GIF, 43 bytes.
const TRACKING_PIXEL: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
    0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, // 1x1, global color table
    0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, // black, white
    0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, // graphic control, transparent
    0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // image descriptor
    0x02, 0x02, 0x44, 0x01, 0x00, // image data
    0x3B, // trailer
];

#[derive(Debug, Deserialize)]
pub struct OpenQuery {
    /// Tracking token.
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

/// `GET /api/track/open?t=<token>` serves the pixel, always 200.
pub async fn track_open(
    State(state): State<AppState>,
    Query(query): Query<OpenQuery>,
) -> Response {
    if let Some(token) = query.t.as_deref().filter(|t| !t.is_empty()) {
        apply_open(&state, token).await;
    } else {
        debug!("Pixel request without token");
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/gif"),
            (
                header::CACHE_CONTROL,
                "no-cache, no-store, must-revalidate",
            ),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        TRACKING_PIXEL.to_vec(),
    )
        .into_response()
}

/// Best-effort tracking update; errors are logged and swallowed.
async fn apply_open(state: &AppState, token: &str) {
    let tracking = EmailTrackingRepository::new(state.pool.clone());
    match tracking.record_open(token).await {
        Ok(Some(entity)) => {
            record_open_tracked();
            debug!(
                tracking_id = %entity.tracking_id,
                opened_count = entity.opened_count,
                "Open recorded"
            );
        }
        Ok(None) => debug!("Pixel token matched no tracking record"),
        Err(err) => warn!(error = %err, "Open tracking update failed"),
    }

    let pricing_guide = PricingGuideRepository::new(state.pool.clone());
    if let Err(err) = pricing_guide.mark_opened(token).await {
        warn!(error = %err, "Pricing guide open update failed");
    }
}

/// `GET /api/unsubscribe?email=&token=` flips the unsubscribe flag when
/// the token matches, and renders a small confirmation page.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(query): Query<UnsubscribeQuery>,
) -> Result<Html<String>, ApiError> {
    let email = query
        .email
        .as_deref()
        .filter(|e| shared::validation::is_valid_email(e))
        .ok_or_else(|| ApiError::Validation("A valid email parameter is required".into()))?;
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("A token parameter is required".into()))?;

    let service = UnsubscribeService::new(PricingGuideRepository::new(state.pool.clone()));
    let outcome = service.unsubscribe_by_token(email, token).await?;

    let body = match outcome {
        UnsubscribeOutcome::Unsubscribed => confirmation_page(
            "You have been unsubscribed",
            "You will no longer receive these emails.",
        ),
        UnsubscribeOutcome::AlreadyUnsubscribed => confirmation_page(
            "Already unsubscribed",
            "This address was already unsubscribed.",
        ),
        UnsubscribeOutcome::InvalidToken => {
            return Err(ApiError::NotFound("Unknown unsubscribe link".into()));
        }
    };

    Ok(Html(body))
}

fn confirmation_page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: sans-serif; max-width: 480px; margin: 80px auto; text-align: center;">
<h1>{title}</h1>
<p>{message}</p>
</body>
</html>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_is_valid_gif89a() {
        assert_eq!(TRACKING_PIXEL.len(), 43);
        assert_eq!(&TRACKING_PIXEL[..6], b"GIF89a");
        assert_eq!(TRACKING_PIXEL[42], 0x3B);
    }

    #[test]
    fn test_pixel_is_one_by_one() {
        // Logical screen width and height, little-endian.
        assert_eq!(&TRACKING_PIXEL[6..10], &[0x01, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_confirmation_page_contains_text() {
        let page = confirmation_page("Done", "All set.");
        assert!(page.contains("<h1>Done</h1>"));
        assert!(page.contains("All set."));
    }
}
