// Command line collaborator: turns flags (and an optional TOML file) into a
// raw configuration and renders reports. All validation happens in the core.

use crate::checker::CheckReport;
use crate::config::{ApiKey, RawCheckConfig, RawNumber, RawTransportConfig, Recipients};
use crate::error::CheckError;
use crate::Result;
use clap::Parser;
use std::path::PathBuf;

/// Days before expiry to alert at when neither a flag nor the file says otherwise
pub const CLI_DEFAULT_DAYS_BEFORE: i64 = 60;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Check a host's TLS certificate and alert before it expires"
)]
pub struct Args {
    /// Host to check
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to connect to [default: 443]
    #[arg(short, long)]
    pub port: Option<String>,

    /// Name sent for SNI [default: the host]
    #[arg(long)]
    pub servername: Option<String>,

    /// Connect and handshake timeout in seconds [default: 10]
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<String>,

    /// Days before expiry to send an alert [default: 60]
    #[arg(short, long = "days-before", value_name = "DAYS")]
    pub days_before: Option<String>,

    /// Alert transport. Available: mailgun
    #[arg(short, long)]
    pub transport: Option<String>,

    /// Address the alert email is sent from
    #[arg(long = "email-from")]
    pub email_from: Option<String>,

    /// Display name for the sender address
    #[arg(long = "email-from-name")]
    pub email_from_name: Option<String>,

    /// Recipient addresses, comma separated
    #[arg(long = "emails-to", value_delimiter = ',')]
    pub emails_to: Vec<String>,

    /// Mailgun sending domain
    #[arg(long = "mailgun-domain")]
    pub mailgun_domain: Option<String>,

    /// Mailgun API key
    #[arg(long = "mailgun-apikey", env = "MAILGUN_API_KEY", hide_env_values = true)]
    pub mailgun_apikey: Option<String>,

    /// Mailgun API base URL, e.g. https://api.eu.mailgun.net
    #[arg(long = "mailgun-api-base")]
    pub mailgun_api_base: Option<String>,

    /// TOML file with check settings; flags override it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    fn has_transport_flags(&self) -> bool {
        self.transport.is_some()
            || self.email_from.is_some()
            || self.email_from_name.is_some()
            || !self.emails_to.is_empty()
            || self.mailgun_domain.is_some()
            || self.mailgun_apikey.is_some()
            || self.mailgun_api_base.is_some()
    }

    fn flag_layer(&self) -> RawCheckConfig {
        let alert_transport = self.has_transport_flags().then(|| RawTransportConfig {
            name: self.transport.clone(),
            domain: self.mailgun_domain.clone(),
            api_key: self.mailgun_apikey.clone().map(ApiKey::new),
            email_from: self.email_from.clone(),
            email_from_name: self.email_from_name.clone(),
            emails_to: (!self.emails_to.is_empty())
                .then(|| Recipients::Many(self.emails_to.clone())),
            api_base: self.mailgun_api_base.clone(),
        });

        RawCheckConfig {
            host: self.host.clone(),
            port: self.port.clone().map(RawNumber::Text),
            servername: self.servername.clone(),
            timeout: self.timeout.clone().map(RawNumber::Text),
            alert_days_before_expiry: self.days_before.clone().map(RawNumber::Text),
            alert_transport,
        }
    }

    /// CLI defaults, then the config file, then flags
    pub fn to_raw_config(&self) -> Result<RawCheckConfig> {
        let defaults = RawCheckConfig {
            alert_days_before_expiry: Some(RawNumber::Int(CLI_DEFAULT_DAYS_BEFORE)),
            ..Default::default()
        };
        let file = match &self.config {
            Some(path) => RawCheckConfig::from_file(path)?,
            None => RawCheckConfig::default(),
        };
        Ok(defaults.overlay(file).overlay(self.flag_layer()))
    }
}

/// Process exit status for a failed check
pub fn exit_code(err: &CheckError) -> u8 {
    if err.is_input_error() {
        2
    } else {
        1
    }
}

/// Human readable report
pub fn render_text(report: &CheckReport) -> String {
    let expiry = report
        .valid_to
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "N/A".into());
    let status = if report.evaluation.is_expired() {
        "EXPIRED".to_string()
    } else {
        format!("{} day(s) remaining", report.evaluation.days_remaining)
    };
    let alert = if report.evaluation.should_alert {
        "ALERT"
    } else {
        "OK"
    };

    let mut out = format!(
        "{}:{}  expires {}  {}  [{}]",
        report.host, report.port, expiry, status, alert
    );
    if let Some(dispatch) = &report.dispatch {
        let state = if dispatch.delivered { "sent" } else { "failed" };
        out.push_str(&format!("\nalert {}: {}", state, dispatch.detail));
    }
    out
}
