// Check configuration: raw input and validation
//
// `RawCheckConfig` is what a caller hands us (CLI flags, a TOML file, or code).
// `RawCheckConfig::validate` never touches its input and builds a fresh,
// fully resolved `CheckConfig`.

use crate::email::is_valid_email;
use crate::error::CheckError;
use crate::Result;
use rustls::pki_types::ServerName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ALERT_DAYS: i64 = 30;
pub const DEFAULT_MAILGUN_API_BASE: &str = "https://api.mailgun.net";

/// A number that may arrive as an integer, a float or as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    /// Integer value, reading only the leading digits of text (`"60 days"` is 60).
    /// Floats are truncated toward zero.
    pub fn coerce(&self) -> Option<i64> {
        match self {
            RawNumber::Int(n) => Some(*n),
            RawNumber::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            RawNumber::Float(_) => None,
            RawNumber::Text(s) => leading_integer(s),
        }
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawNumber::Int(n) => write!(f, "{}", n),
            RawNumber::Float(n) => write!(f, "{}", n),
            RawNumber::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RawNumber {
    fn from(n: i64) -> Self {
        RawNumber::Int(n)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(s: String) -> Self {
        RawNumber::Text(s)
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// Provider API key. Its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Recipients given either as one address or as a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    fn into_vec(self) -> Vec<String> {
        match self {
            Recipients::One(addr) => vec![addr],
            Recipients::Many(addrs) => addrs,
        }
    }
}

/// Unvalidated alert transport settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTransportConfig {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub api_key: Option<ApiKey>,
    pub email_from: Option<String>,
    pub email_from_name: Option<String>,
    pub emails_to: Option<Recipients>,
    pub api_base: Option<String>,
}

/// Unvalidated check settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCheckConfig {
    pub host: Option<String>,
    pub port: Option<RawNumber>,
    pub servername: Option<String>,
    pub timeout: Option<RawNumber>,
    #[serde(alias = "days_before")]
    pub alert_days_before_expiry: Option<RawNumber>,
    pub alert_transport: Option<RawTransportConfig>,
}

/// Alert transport, fully validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Email(EmailConfig),
}

/// Settings for the Mailgun backed email transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    sender_address: String,
    sender_display_name: String,
    recipients: Vec<String>,
    provider_domain: String,
    api_key: ApiKey,
    api_base: String,
}

impl EmailConfig {
    pub fn sender_display_name(&self) -> &str {
        &self.sender_display_name
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn provider_domain(&self) -> &str {
        &self.provider_domain
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `"Name <address>"` when a display name is set, otherwise the bare address
    pub fn formatted_sender(&self) -> String {
        let name = self.sender_display_name.trim();
        if name.is_empty() {
            self.sender_address.clone()
        } else {
            format!("{} <{}>", name, self.sender_address)
        }
    }
}

/// Fully resolved settings for one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    host: String,
    port: u16,
    server_name: String,
    timeout: Duration,
    alert_threshold_days: i64,
    transport: Option<TransportConfig>,
}

impl CheckConfig {
    /// Default settings for `host`, no transport
    pub fn for_host(host: &str) -> Result<Self> {
        RawCheckConfig {
            host: Some(host.to_string()),
            ..Default::default()
        }
        .validate()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Name sent as SNI during the handshake
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn alert_threshold_days(&self) -> i64 {
        self.alert_threshold_days
    }

    pub fn transport(&self) -> Option<&TransportConfig> {
        self.transport.as_ref()
    }

    /// `host:port`, used in logs and connection errors
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RawCheckConfig {
    /// Parse the raw form from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| CheckError::validation("config", format!("failed to parse TOML: {}", e)))
    }

    /// Load the raw form from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            CheckError::validation(
                "config",
                format!("failed to read {}: {}", path.as_ref().display(), e),
            )
        })?;
        Self::from_toml_str(&contents)
    }

    /// Layer `other` on top of `self`; any value set in `other` wins
    pub fn overlay(self, other: RawCheckConfig) -> RawCheckConfig {
        let alert_transport = match (self.alert_transport, other.alert_transport) {
            (Some(base), Some(top)) => Some(base.overlay(top)),
            (base, top) => top.or(base),
        };
        RawCheckConfig {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            servername: other.servername.or(self.servername),
            timeout: other.timeout.or(self.timeout),
            alert_days_before_expiry: other
                .alert_days_before_expiry
                .or(self.alert_days_before_expiry),
            alert_transport,
        }
    }

    /// Normalize and validate into a `CheckConfig`.
    ///
    /// Fields are checked in order: host, port, servername, timeout,
    /// transport, threshold. The first failure is returned.
    pub fn validate(&self) -> Result<CheckConfig> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| CheckError::validation("host", "missing host"))?
            .trim();
        if host.is_empty() {
            return Err(CheckError::validation("host", "host cannot be empty"));
        }

        let port = validate_port(self.port.as_ref())?;

        // Without an explicit servername the host doubles as SNI
        let (server_name, field) = match self.servername.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => (name.to_string(), "servername"),
            _ => (host.to_string(), "host"),
        };
        if ServerName::try_from(server_name.as_str()).is_err() {
            return Err(CheckError::validation(
                field,
                format!("'{}' is not a valid TLS server name", server_name),
            ));
        }

        let timeout = validate_timeout(self.timeout.as_ref())?;

        let transport = match &self.alert_transport {
            Some(raw) => raw.validate()?,
            None => None,
        };

        let alert_threshold_days = alert_threshold_days(self.alert_days_before_expiry.as_ref());

        Ok(CheckConfig {
            host: host.to_string(),
            port,
            server_name,
            timeout,
            alert_threshold_days,
            transport,
        })
    }
}

fn validate_port(raw: Option<&RawNumber>) -> Result<u16> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PORT);
    };
    match raw.coerce() {
        Some(port) if (1..=65535).contains(&port) => Ok(port as u16),
        _ => Err(CheckError::validation(
            "port",
            format!("'{}' is not between 1 and 65535", raw),
        )),
    }
}

fn validate_timeout(raw: Option<&RawNumber>) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    match raw.coerce() {
        Some(secs) if secs > 0 => Ok(Duration::from_secs(secs as u64)),
        _ => Err(CheckError::validation(
            "timeout",
            "timeout must be a positive number of seconds",
        )),
    }
}

/// Missing or non-numeric falls back to 30 days; zero and below clamp to 1
fn alert_threshold_days(raw: Option<&RawNumber>) -> i64 {
    let days = raw
        .and_then(RawNumber::coerce)
        .unwrap_or(DEFAULT_ALERT_DAYS);
    if days <= 0 {
        1
    } else {
        days
    }
}

impl RawTransportConfig {
    fn overlay(self, other: RawTransportConfig) -> RawTransportConfig {
        RawTransportConfig {
            name: other.name.or(self.name),
            domain: other.domain.or(self.domain),
            api_key: other.api_key.or(self.api_key),
            email_from: other.email_from.or(self.email_from),
            email_from_name: other.email_from_name.or(self.email_from_name),
            emails_to: other.emails_to.or(self.emails_to),
            api_base: other.api_base.or(self.api_base),
        }
    }

    /// No name means no transport at all, which is not an error
    fn validate(&self) -> Result<Option<TransportConfig>> {
        let Some(name) = self.name.as_deref() else {
            return Ok(None);
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "mailgun" | "email" => self.validate_email().map(|c| Some(TransportConfig::Email(c))),
            _ => Err(CheckError::UnsupportedTransport(name.to_string())),
        }
    }

    fn validate_email(&self) -> Result<EmailConfig> {
        let provider_domain = self
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| CheckError::validation("domain", "missing Mailgun domain"))?;

        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.expose().trim().is_empty())
            .ok_or_else(|| CheckError::validation("api_key", "missing Mailgun API key"))?;

        let sender_address = self
            .email_from
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| CheckError::validation("email_from", "missing sender address"))?;
        if !is_valid_email(sender_address) {
            return Err(CheckError::validation(
                "email_from",
                format!("'{}' is not a valid email address", sender_address),
            ));
        }

        let recipients: Vec<String> = self
            .emails_to
            .clone()
            .ok_or_else(|| CheckError::validation("emails_to", "missing recipient addresses"))?
            .into_vec()
            .into_iter()
            .map(|addr| addr.trim().to_string())
            .collect();
        if recipients.is_empty() {
            return Err(CheckError::validation(
                "emails_to",
                "recipient addresses cannot be empty",
            ));
        }
        if let Some(bad) = recipients.iter().find(|addr| !is_valid_email(addr)) {
            return Err(CheckError::validation(
                "emails_to",
                format!("'{}' is not a valid email address", bad),
            ));
        }

        let api_base = self
            .api_base
            .as_deref()
            .map(|base| base.trim().trim_end_matches('/'))
            .filter(|base| !base.is_empty())
            .unwrap_or(DEFAULT_MAILGUN_API_BASE)
            .to_string();

        Ok(EmailConfig {
            sender_address: sender_address.to_string(),
            sender_display_name: self.email_from_name.clone().unwrap_or_default(),
            recipients,
            provider_domain: provider_domain.to_string(),
            api_key,
            api_base,
        })
    }
}
