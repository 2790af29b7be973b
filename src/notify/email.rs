// Email transport
//
// Addresses were checked during config validation, so sending only has to
// format the sender and hand the message to the provider.

use crate::config::EmailConfig;
use crate::error::ProviderError;
use crate::notify::{AlertMessage, DispatchOutcome};
use async_trait::async_trait;
use std::sync::Arc;

/// A message as submitted to an email provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email sending API. Implemented by `MailgunClient`; tests inject their own.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Submit one message on behalf of `account`, returning the provider's
    /// acknowledgement text.
    async fn create_message(
        &self,
        account: &EmailConfig,
        email: &OutgoingEmail,
    ) -> Result<String, ProviderError>;
}

pub struct EmailTransport {
    config: EmailConfig,
    provider: Arc<dyn MailProvider>,
}

impl EmailTransport {
    pub fn new(config: EmailConfig, provider: Arc<dyn MailProvider>) -> Self {
        Self { config, provider }
    }

    fn build_email(&self, message: &AlertMessage) -> OutgoingEmail {
        OutgoingEmail {
            from: self.config.formatted_sender(),
            to: self.config.recipients().to_vec(),
            subject: message.subject.clone(),
            text: message.body.clone(),
            html: message.body.clone(),
        }
    }

    /// Never fails: provider errors come back as an undelivered outcome
    pub async fn send(&self, message: &AlertMessage) -> DispatchOutcome {
        let email = self.build_email(message);
        tracing::debug!(
            from = %email.from,
            recipients = email.to.len(),
            domain = self.config.provider_domain(),
            "Submitting alert email"
        );
        match self.provider.create_message(&self.config, &email).await {
            Ok(ack) => DispatchOutcome::delivered(ack),
            Err(e) => DispatchOutcome::failed(e.to_string()),
        }
    }
}
