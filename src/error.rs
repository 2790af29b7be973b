// Error types for a certificate expiry check
//
// Validation, connection and certificate failures abort a check and are handed
// back to the caller untouched. Alert delivery failures never show up here,
// they are folded into a `DispatchOutcome` instead.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single certificate check
#[derive(Debug, Error)]
pub enum CheckError {
    /// A configuration field was missing or malformed
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The requested alert transport is not one we know how to drive
    #[error("Alert transport '{0}' is not supported")]
    UnsupportedTransport(String),

    /// The TLS peer could not be reached or the handshake failed
    #[error("Connection to {target} failed: {source}")]
    Connection {
        target: String,
        #[source]
        source: ConnectionFailure,
    },

    /// The handshake succeeded but the peer certificate is unusable
    #[error("Invalid peer certificate: {0}")]
    Certificate(String),
}

/// What went wrong while talking to the TLS peer
#[derive(Debug, Error)]
pub enum ConnectionFailure {
    #[error("DNS resolution failed: {0}")]
    Resolve(#[source] io::Error),

    #[error("host resolved to no addresses")]
    NoAddress,

    #[error("TCP connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Error reported by an email provider. Never escapes the dispatcher.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

impl CheckError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CheckError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn connection(target: impl Into<String>, source: ConnectionFailure) -> Self {
        CheckError::Connection {
            target: target.into(),
            source,
        }
    }

    /// Name of the offending field for validation errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CheckError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// True for errors the caller can fix by changing its input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CheckError::Validation { .. } | CheckError::UnsupportedTransport(_)
        )
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, CheckError::Connection { .. })
    }

    pub fn is_certificate(&self) -> bool {
        matches!(self, CheckError::Certificate(_))
    }
}
