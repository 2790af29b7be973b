// Expiry Evaluator - days remaining and whether that warrants an alert

use crate::error::CheckError;
use crate::fetcher::CertificateInfo;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// `days_remaining` for a certificate that has already expired
pub const EXPIRED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryEvaluation {
    pub days_remaining: i64,
    pub should_alert: bool,
}

impl ExpiryEvaluation {
    pub fn is_expired(&self) -> bool {
        self.days_remaining == EXPIRED
    }
}

/// Evaluate against a fixed `now`.
///
/// Days remaining are rounded to the nearest whole day. The alert fires when
/// the threshold is greater than or equal to the days remaining, so a
/// certificate expiring in exactly `threshold` days alerts.
pub fn evaluate_at(
    info: &CertificateInfo,
    alert_threshold_days: i64,
    now: DateTime<Utc>,
) -> Result<ExpiryEvaluation> {
    if info.valid_from.is_none() {
        return Err(CheckError::Certificate("missing notBefore date".into()));
    }
    let valid_to = info
        .valid_to
        .ok_or_else(|| CheckError::Certificate("missing notAfter date".into()))?;

    if now > valid_to {
        return Ok(ExpiryEvaluation {
            days_remaining: EXPIRED,
            should_alert: true,
        });
    }

    let remaining_ms = (valid_to - now).num_milliseconds() as f64;
    let days_remaining = (remaining_ms / MILLIS_PER_DAY).round() as i64;
    Ok(ExpiryEvaluation {
        days_remaining,
        should_alert: alert_threshold_days >= days_remaining,
    })
}
