//! Checks the TLS certificate a host presents, works out how many days it has
//! left, and optionally sends an alert when that falls within a threshold.
//!
//! ```no_run
//! # async fn run() -> ssl_expiry_alert::Result<()> {
//! use ssl_expiry_alert::{check_certificate, CheckConfig};
//!
//! let report = check_certificate(CheckConfig::for_host("example.com")?).await?;
//! println!("{} days left", report.evaluation.days_remaining);
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod cli;
pub mod config;
pub mod email;
pub mod error;
pub mod expiry;
pub mod fetcher;
pub mod notify;

pub use crate::checker::{check_certificate, CheckReport, Checker};
pub use crate::config::{CheckConfig, RawCheckConfig, TransportConfig};
pub use crate::error::{CheckError, ConnectionFailure, ProviderError};
pub use crate::expiry::ExpiryEvaluation;
pub use crate::fetcher::CertificateInfo;
pub use crate::notify::DispatchOutcome;

/// Result type for certificate checks
pub type Result<T> = std::result::Result<T, CheckError>;
