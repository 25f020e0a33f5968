//! Email service for sending transactional pipeline emails.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails to console (development)
//! - `resend`: Sends via the Resend HTTP API

use crate::config::EmailConfig;
use domain::models::{EmailType, NO_ORDER};
use persistence::entities::EmailTrackingEntity;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body_text: String,
    /// HTML body (optional)
    pub body_html: Option<String>,
}

/// Result of a successful provider send.
#[derive(Debug, Clone, Default)]
pub struct SendOutcome {
    /// Provider-assigned message ID, when the provider returns one.
    pub provider_message_id: Option<String>,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    /// Send an email message, returning the provider message ID when known.
    pub async fn send(&self, message: &EmailMessage) -> Result<SendOutcome, EmailError> {
        if !shared::validation::is_valid_email(&message.to) {
            return Err(EmailError::InvalidAddress(message.to.clone()));
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "resend" => self.send_resend(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Rebuilds and sends the message for an existing tracking record.
    ///
    /// Used by the retry scheduler, which only has the tracking row to work
    /// from, so message content is reconstructed from the record's type.
    pub async fn resend(&self, record: &EmailTrackingEntity) -> Result<SendOutcome, EmailError> {
        let email_type = record
            .email_type()
            .ok_or_else(|| EmailError::SendFailed(format!("unknown email type: {}", record.email_type)))?;

        let message = self.build_message(
            email_type,
            &record.recipient,
            &record.order_id,
            &record.tracking_token,
        );
        self.send(&message).await
    }

    /// Builds the message for an email type, with open tracking pixel and,
    /// for pricing guides, an unsubscribe link.
    pub fn build_message(
        &self,
        email_type: EmailType,
        recipient: &str,
        order_id: &str,
        tracking_token: &str,
    ) -> EmailMessage {
        let (subject, intro) = match email_type {
            EmailType::Confirmation => (
                format!("Order {} confirmed", order_id),
                format!("Your order {} has been confirmed.", order_id),
            ),
            EmailType::Delivery => (
                format!("Order {} is on its way", order_id),
                format!("Your order {} has shipped and is on its way.", order_id),
            ),
            EmailType::PricingGuide => (
                "Your pricing guide".to_string(),
                "Thanks for your interest. Your pricing guide is attached below.".to_string(),
            ),
            EmailType::Manual => {
                let subject = if order_id == NO_ORDER {
                    format!("A message from {}", self.config.sender_name)
                } else {
                    format!("An update on order {}", order_id)
                };
                (subject, "We have an update for you.".to_string())
            }
        };

        let pixel_url = format!("{}/api/track/open?t={}", self.config.base_url, tracking_token);

        let unsubscribe_html = if email_type == EmailType::PricingGuide {
            format!(
                r#"<p style="font-size:12px;color:#999;"><a href="{}/api/unsubscribe?email={}&token={}">Unsubscribe</a></p>"#,
                self.config.base_url, recipient, tracking_token
            )
        } else {
            String::new()
        };

        let body_text = format!(
            "{intro}\n\nBest regards,\n{name}",
            intro = intro,
            name = self.config.sender_name
        );

        let body_html = format!(
            r#"<html><body>
<p>{intro}</p>
<p>Best regards,<br>{name}</p>
{unsubscribe}
<img src="{pixel}" width="1" height="1" alt="" style="display:none;">
</body></html>"#,
            intro = intro,
            name = self.config.sender_name,
            unsubscribe = unsubscribe_html,
            pixel = pixel_url,
        );

        EmailMessage {
            to: recipient.to_string(),
            subject,
            body_text,
            body_html: Some(body_html),
        }
    }

    /// Console provider - logs email to console (for development).
    async fn send_console(&self, message: &EmailMessage) -> Result<SendOutcome, EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );

        debug!(
            body_text = %message.body_text,
            "Email body (plain text)"
        );

        Ok(SendOutcome {
            provider_message_id: Some(format!("console-{}", uuid::Uuid::new_v4())),
        })
    }

    /// Resend provider - sends via the Resend HTTP API.
    async fn send_resend(&self, message: &EmailMessage) -> Result<SendOutcome, EmailError> {
        if self.config.api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let mut body = serde_json::json!({
            "from": format!("{} <{}>", self.config.sender_name, self.config.sender_email),
            "to": [message.to],
            "subject": message.subject,
            "text": message.body_text,
        });

        if let Some(html) = &message.body_html {
            body["html"] = serde_json::json!(html);
        }

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("Resend request failed: {}", e)))?;

        if response.status().is_success() {
            let parsed: serde_json::Value = response
                .json()
                .await
                .map_err(|e| EmailError::ProviderError(format!("Invalid Resend response: {}", e)))?;

            let provider_message_id = parsed
                .get("id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            info!(
                to = %message.to,
                subject = %message.subject,
                message_id = ?provider_message_id,
                "Email sent via Resend"
            );

            Ok(SendOutcome {
                provider_message_id,
            })
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                error = %error_body,
                "Resend API error"
            );
            Err(EmailError::ProviderError(format!(
                "Resend returned {}: {}",
                status, error_body
            )))
        }
    }
}
