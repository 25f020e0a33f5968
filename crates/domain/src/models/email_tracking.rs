//! Email tracking domain model.
//!
//! One tracking record exists per send attempt; retries mutate the same
//! record. Status is a closed enum so only the legal lifecycle transitions
//! can be expressed:
//!
//! `sent -> delivered`, `sent/delivered -> opened`,
//! `failed -> retried -> {sent | failed}`, `{sent | failed} -> bounced`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum number of retry attempts per tracking record.
pub const MAX_RETRIES: i32 = 4;

/// Placeholder order id for emails not tied to an order.
pub const NO_ORDER: &str = "none";

/// Lifecycle status of a tracking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// Accepted by the provider (or a successful retry).
    Sent,
    /// Provider confirmed delivery to the recipient server.
    Delivered,
    /// Recipient opened the email at least once.
    Opened,
    /// Provider-level send failure, eligible for retry.
    Failed,
    /// Claimed by a retry pass; transient while the resend is in flight.
    Retried,
    /// Terminal delivery failure.
    Bounced,
}

/// Error returned when an illegal status transition is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Illegal status transition: {from:?} -> {to:?}")]
pub struct StatusError {
    pub from: EmailStatus,
    pub to: EmailStatus,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Delivered => "delivered",
            EmailStatus::Opened => "opened",
            EmailStatus::Failed => "failed",
            EmailStatus::Retried => "retried",
            EmailStatus::Bounced => "bounced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(EmailStatus::Sent),
            "delivered" => Some(EmailStatus::Delivered),
            "opened" => Some(EmailStatus::Opened),
            "failed" => Some(EmailStatus::Failed),
            "retried" => Some(EmailStatus::Retried),
            "bounced" => Some(EmailStatus::Bounced),
            _ => None,
        }
    }

    /// Whether the transition `self -> to` is legal.
    ///
    /// `opened` is reachable from both `sent` and `delivered` (delivery
    /// confirmation and opens are not mutually exclusive). `bounced` is
    /// reachable from `sent` (async bounce after acceptance), `failed`
    /// (retry exhaustion), and `retried` (bounce during a retry).
    pub fn can_transition_to(&self, to: EmailStatus) -> bool {
        use EmailStatus::*;
        matches!(
            (self, to),
            (Sent, Delivered)
                | (Sent, Opened)
                | (Sent, Bounced)
                | (Delivered, Opened)
                | (Failed, Retried)
                | (Failed, Bounced)
                | (Retried, Sent)
                | (Retried, Failed)
                | (Retried, Bounced)
        )
    }

    /// Applies a transition, rejecting illegal ones.
    pub fn transition(self, to: EmailStatus) -> Result<EmailStatus, StatusError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(StatusError { from: self, to })
        }
    }

    /// Terminal statuses are never picked up by the retry pass.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EmailStatus::Bounced)
    }
}

/// Bounce classification reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BounceType {
    /// Permanent failure (invalid or nonexistent address).
    Hard,
    /// Temporary failure (mailbox full, transient server issue).
    Soft,
    Unknown,
}

impl BounceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BounceType::Hard => "hard",
            BounceType::Soft => "soft",
            BounceType::Unknown => "unknown",
        }
    }

    /// Maps the free-text bounce type from a provider event.
    pub fn from_provider(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "hard" | "permanent" => BounceType::Hard,
            "soft" | "transient" | "temporary" => BounceType::Soft,
            _ => BounceType::Unknown,
        }
    }
}

/// Kind of transactional email being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    Confirmation,
    Delivery,
    Manual,
    PricingGuide,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Confirmation => "confirmation",
            EmailType::Delivery => "delivery",
            EmailType::Manual => "manual",
            EmailType::PricingGuide => "pricing_guide",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmation" => Some(EmailType::Confirmation),
            "delivery" => Some(EmailType::Delivery),
            "manual" => Some(EmailType::Manual),
            "pricing_guide" => Some(EmailType::PricingGuide),
            _ => None,
        }
    }
}

/// One email send attempt and its delivery lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmailTrackingRecord {
    pub tracking_id: Uuid,
    pub order_id: String,
    pub email_type: EmailType,
    /// Recipient address, stored verbatim (not normalized).
    pub recipient: String,
    pub sender_domain: String,
    pub provider_message_id: Option<String>,
    pub tracking_token: String,
    pub status: EmailStatus,
    pub sent_at: DateTime<Utc>,
    /// First open only; never overwritten.
    pub opened_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    /// Incremented on every open.
    pub opened_count: i32,
    pub failure_reason: Option<String>,
    pub bounce_type: Option<BounceType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            EmailStatus::Sent,
            EmailStatus::Delivered,
            EmailStatus::Opened,
            EmailStatus::Failed,
            EmailStatus::Retried,
            EmailStatus::Bounced,
        ] {
            assert_eq!(EmailStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EmailStatus::parse("pending"), None);
    }

    #[test]
    fn test_legal_transitions() {
        assert!(EmailStatus::Sent.can_transition_to(EmailStatus::Delivered));
        assert!(EmailStatus::Sent.can_transition_to(EmailStatus::Opened));
        assert!(EmailStatus::Delivered.can_transition_to(EmailStatus::Opened));
        assert!(EmailStatus::Failed.can_transition_to(EmailStatus::Retried));
        assert!(EmailStatus::Retried.can_transition_to(EmailStatus::Sent));
        assert!(EmailStatus::Retried.can_transition_to(EmailStatus::Failed));
        assert!(EmailStatus::Failed.can_transition_to(EmailStatus::Bounced));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        // A bounced record can never go back to sent without a retry claim.
        assert!(!EmailStatus::Bounced.can_transition_to(EmailStatus::Sent));
        // Delivered is narrower than opened/bounced; no downgrade.
        assert!(!EmailStatus::Opened.can_transition_to(EmailStatus::Delivered));
        assert!(!EmailStatus::Bounced.can_transition_to(EmailStatus::Delivered));
        // Failed records must be claimed before resending.
        assert!(!EmailStatus::Failed.can_transition_to(EmailStatus::Sent));

        let err = EmailStatus::Bounced
            .transition(EmailStatus::Sent)
            .unwrap_err();
        assert_eq!(err.from, EmailStatus::Bounced);
        assert_eq!(err.to, EmailStatus::Sent);
    }

    #[test]
    fn test_transition_ok() {
        let status = EmailStatus::Failed.transition(EmailStatus::Retried).unwrap();
        assert_eq!(status, EmailStatus::Retried);
    }

    #[test]
    fn test_only_bounced_is_terminal() {
        assert!(EmailStatus::Bounced.is_terminal());
        assert!(!EmailStatus::Failed.is_terminal());
        assert!(!EmailStatus::Opened.is_terminal());
    }

    #[test]
    fn test_bounce_type_from_provider() {
        assert_eq!(BounceType::from_provider("hard"), BounceType::Hard);
        assert_eq!(BounceType::from_provider("Permanent"), BounceType::Hard);
        assert_eq!(BounceType::from_provider("soft"), BounceType::Soft);
        assert_eq!(BounceType::from_provider("Transient"), BounceType::Soft);
        assert_eq!(BounceType::from_provider("weird"), BounceType::Unknown);
    }

    #[test]
    fn test_email_type_parse() {
        assert_eq!(EmailType::parse("pricing_guide"), Some(EmailType::PricingGuide));
        assert_eq!(EmailType::parse("confirmation"), Some(EmailType::Confirmation));
        assert_eq!(EmailType::parse("newsletter"), None);
    }
}
