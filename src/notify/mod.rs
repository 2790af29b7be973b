// Notification Dispatcher
//
// Alerts are best effort: whatever the transport does, the caller gets a
// `DispatchOutcome` back and the expiry evaluation is still reported.

pub mod email;
pub mod mailgun;

use crate::config::TransportConfig;
use crate::expiry::ExpiryEvaluation;
use serde::Serialize;
use std::sync::Arc;

pub use email::{EmailTransport, MailProvider, OutgoingEmail};
pub use mailgun::MailgunClient;

/// Subject and plain text body of an expiry alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    pub fn compose(host: &str, evaluation: &ExpiryEvaluation) -> Self {
        let subject = format!("[{}] SSL Certificate Expiry Alert", host);
        let body = if evaluation.is_expired() {
            format!(
                "Your Domain [{}] SSL Certificate was Expired, please update it asap.",
                host
            )
        } else {
            format!(
                "Your Domain [{}] SSL Certificate was nearly to Expire, please update it asap. Days Remaining: {} Day(s)",
                host, evaluation.days_remaining
            )
        };
        Self { subject, body }
    }
}

/// Result of handing an alert to a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub delivered: bool,
    pub detail: String,
}

impl DispatchOutcome {
    pub fn delivered(detail: impl Into<String>) -> Self {
        Self {
            delivered: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            delivered: false,
            detail: detail.into(),
        }
    }
}

/// The alert transports we can drive. Adding one means adding a variant.
pub enum AlertTransport {
    Email(EmailTransport),
}

impl AlertTransport {
    /// Build the transport for a validated config
    pub fn from_config(config: &TransportConfig, mail: Arc<dyn MailProvider>) -> Self {
        match config {
            TransportConfig::Email(email) => {
                AlertTransport::Email(EmailTransport::new(email.clone(), mail))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlertTransport::Email(_) => "email",
        }
    }

    pub async fn send(&self, message: &AlertMessage) -> DispatchOutcome {
        match self {
            AlertTransport::Email(transport) => transport.send(message).await,
        }
    }
}

/// Send an alert if the evaluation calls for one.
///
/// Returns `None` when no alert was due, otherwise the transport's outcome.
pub async fn dispatch(
    host: &str,
    evaluation: &ExpiryEvaluation,
    transport: &AlertTransport,
) -> Option<DispatchOutcome> {
    if !evaluation.should_alert {
        return None;
    }

    let message = AlertMessage::compose(host, evaluation);
    let outcome = transport.send(&message).await;
    if outcome.delivered {
        tracing::info!(
            host,
            transport = transport.name(),
            detail = %outcome.detail,
            "Expiry alert sent"
        );
    } else {
        tracing::warn!(
            host,
            transport = transport.name(),
            detail = %outcome.detail,
            "Failed to send expiry alert"
        );
    }
    Some(outcome)
}
