// Mailgun messages API client

use crate::config::EmailConfig;
use crate::error::ProviderError;
use crate::notify::email::{MailProvider, OutgoingEmail};
use async_trait::async_trait;
use serde::Deserialize;

/// Response body of `POST /v3/{domain}/messages`
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Sends mail through the Mailgun HTTP API
#[derive(Clone)]
pub struct MailgunClient {
    client: reqwest::Client,
}

impl MailgunClient {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn messages_url(account: &EmailConfig) -> String {
        format!(
            "{}/v3/{}/messages",
            account.api_base(),
            account.provider_domain()
        )
    }

    fn form(email: &OutgoingEmail) -> Vec<(&'static str, &str)> {
        let mut form = Vec::with_capacity(email.to.len() + 4);
        form.push(("from", email.from.as_str()));
        for to in &email.to {
            form.push(("to", to.as_str()));
        }
        form.push(("subject", email.subject.as_str()));
        form.push(("text", email.text.as_str()));
        form.push(("html", email.html.as_str()));
        form
    }
}

#[async_trait]
impl MailProvider for MailgunClient {
    async fn create_message(
        &self,
        account: &EmailConfig,
        email: &OutgoingEmail,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(Self::messages_url(account))
            .basic_auth("api", Some(account.api_key().expose()))
            .form(&Self::form(email))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(match serde_json::from_str::<SendResponse>(&body) {
            Ok(SendResponse {
                id: Some(id),
                message: Some(message),
            }) => format!("{} ({})", message, id),
            Ok(SendResponse {
                message: Some(message),
                ..
            }) => message,
            _ => body,
        })
    }
}
