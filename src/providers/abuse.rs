//! Abuse-report provider.
//!
//! Authenticated per request with a `Key` header; the interesting fields sit
//! under a nested `data` object. A missing credential fails this provider
//! only, never the scan.

use log::debug;
use serde_json::Value;

use crate::config::{ABUSE_MAX_AGE_DAYS, MAX_ABUSE_SCORE};
use crate::error_handling::ProviderError;
use crate::gateway::ProviderGateway;
use crate::providers::{first_string, number_or_zero};

/// Abuse summary for one IP.
#[derive(Debug, Clone, Default)]
pub struct AbuseReport {
    /// Provider confidence score (0-100).
    pub confidence_score: u8,
    /// Number of reports on file within the lookback window.
    pub total_reports: u32,
    /// Most recent report time, raw.
    pub last_reported_at: Option<String>,
}

impl AbuseReport {
    /// Parses an abuse response body, reading the nested `data` object.
    pub fn from_body(body: &str) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("abuse response: {e}")))?;
        let data = value
            .get("data")
            .ok_or_else(|| ProviderError::Parse("abuse response missing data".to_string()))?;
        Ok(Self {
            confidence_score: number_or_zero(data.get("abuseConfidenceScore"))
                .min(MAX_ABUSE_SCORE) as u8,
            total_reports: number_or_zero(data.get("totalReports")),
            last_reported_at: first_string(data, &["lastReportedAt"]),
        })
    }
}

/// Checks an IP against the abuse-report provider.
///
/// Fails with a configuration error when no API key is available.
pub async fn check(
    gateway: &ProviderGateway,
    base: &str,
    api_key: Option<&str>,
    ip: &str,
) -> Result<AbuseReport, ProviderError> {
    let key = api_key
        .ok_or_else(|| ProviderError::Configuration("ABUSEIPDB_API_KEY not set".to_string()))?;
    let url = format!("{base}/abuse/check?ipAddress={ip}&maxAgeInDays={ABUSE_MAX_AGE_DAYS}");
    debug!("abuse check: {url}");
    let response = gateway
        .get_ok(&url, &[("Accept", "application/json"), ("Key", key)])
        .await?;
    AbuseReport::from_body(&response.body)
}
