//! Provider delivery-event payloads.
//!
//! Shape follows the sending provider's webhook format:
//! `{type, created_at, data: {email_id, to[], from, subject, bounce?}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types the pipeline reacts to. Anything else is acknowledged and
/// ignored so new provider event types never break the webhook.
pub const EVENT_BOUNCED: &str = "email.bounced";
pub const EVENT_DELIVERED: &str = "email.delivered";
pub const EVENT_OPENED: &str = "email.opened";

/// A delivery event posted by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub data: EmailEventData,
}

/// Event payload body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEventData {
    pub email_id: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub bounce: Option<BounceDetail>,
}

/// Bounce metadata attached to `email.bounced` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BounceDetail {
    #[serde(rename = "type")]
    pub bounce_type: Option<String>,
    pub reason: Option<String>,
}

impl EmailEvent {
    /// First recipient of the event, if any.
    pub fn recipient(&self) -> Option<&str> {
        self.data.to.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_bounce_event() {
        let json = r#"{
            "type": "email.bounced",
            "created_at": "2026-08-25T10:15:00Z",
            "data": {
                "email_id": "msg_8f2a",
                "to": ["a@b.com"],
                "from": "noreply@mailroom.app",
                "subject": "Your order confirmation",
                "bounce": {"type": "hard", "reason": "550 user unknown"}
            }
        }"#;

        let event: EmailEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EVENT_BOUNCED);
        assert_eq!(event.recipient(), Some("a@b.com"));
        let bounce = event.data.bounce.unwrap();
        assert_eq!(bounce.bounce_type.as_deref(), Some("hard"));
        assert_eq!(bounce.reason.as_deref(), Some("550 user unknown"));
    }

    #[test]
    fn test_deserialize_delivered_event_without_bounce() {
        let json = r#"{
            "type": "email.delivered",
            "created_at": null,
            "data": {"email_id": "msg_1", "to": ["x@y.com"], "from": null, "subject": null, "bounce": null}
        }"#;

        let event: EmailEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EVENT_DELIVERED);
        assert!(event.data.bounce.is_none());
    }

    #[test]
    fn test_missing_to_defaults_empty() {
        let json = r#"{"type": "email.delivered", "data": {}}"#;
        let event: EmailEvent = serde_json::from_str(json).unwrap();
        assert!(event.data.to.is_empty());
        assert_eq!(event.recipient(), None);
    }
}
