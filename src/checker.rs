// Orchestrator: validate -> fetch -> evaluate -> dispatch (when due)
//
// Validation, fetch and evaluation errors short circuit. Dispatch problems are
// reported inside the result and never fail the check.

use crate::config::{CheckConfig, RawCheckConfig};
use crate::expiry::{evaluate_at, ExpiryEvaluation};
use crate::fetcher::fetch_certificate;
use crate::notify::{dispatch, AlertTransport, DispatchOutcome, MailProvider, MailgunClient};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one certificate check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub host: String,
    pub port: u16,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub evaluation: ExpiryEvaluation,
    /// Present only when an alert was actually sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchOutcome>,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs certificate checks. Holds no per-check state, so one instance can
/// serve any number of concurrent checks.
#[derive(Clone)]
pub struct Checker {
    mail: Arc<dyn MailProvider>,
    clock: Clock,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    /// Checker that sends mail through Mailgun and uses the system clock
    pub fn new() -> Self {
        Self {
            mail: Arc::new(MailgunClient::with_client(reqwest::Client::new())),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_mail_provider(mut self, mail: Arc<dyn MailProvider>) -> Self {
        self.mail = mail;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Check one validated configuration
    pub async fn check(&self, config: CheckConfig) -> Result<CheckReport> {
        let certificate = fetch_certificate(&config).await?;
        let evaluation = evaluate_at(
            &certificate,
            config.alert_threshold_days(),
            (self.clock)(),
        )?;
        info!(
            peer = %config.target(),
            days_remaining = evaluation.days_remaining,
            should_alert = evaluation.should_alert,
            "Certificate evaluated"
        );

        let outcome = match config.transport() {
            Some(transport) if evaluation.should_alert => {
                let transport = AlertTransport::from_config(transport, self.mail.clone());
                dispatch(config.host(), &evaluation, &transport).await
            }
            Some(_) => {
                debug!(peer = %config.target(), "No alert due");
                None
            }
            None => None,
        };

        Ok(CheckReport {
            host: config.host().to_string(),
            port: config.port(),
            valid_from: certificate.valid_from,
            valid_to: certificate.valid_to,
            evaluation,
            dispatch: outcome,
        })
    }

    /// Validate, then check. Validation failures never touch the network.
    pub async fn check_raw(&self, raw: &RawCheckConfig) -> Result<CheckReport> {
        let config = raw.validate()?;
        debug!(?config, "Configuration validated");
        self.check(config).await
    }

    /// Run independent checks concurrently, results in input order
    pub async fn check_many(&self, configs: Vec<CheckConfig>) -> Vec<Result<CheckReport>> {
        let checks = configs.into_iter().map(|config| self.check(config));
        futures::future::join_all(checks).await
    }
}

/// Check one host with the default Mailgun transport and system clock
pub async fn check_certificate(config: CheckConfig) -> Result<CheckReport> {
    Checker::new().check(config).await
}
