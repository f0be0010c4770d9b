//! DNS-blacklist provider.
//!
//! Used as a fallback signal when the abuse provider gave nothing: each
//! blacklist listing contributes a fixed number of points toward an
//! estimated abuse score, capped at the score ceiling.

use log::debug;
use serde_json::Value;

use crate::config::{DNSBL_ZONE_WEIGHT, MAX_ABUSE_SCORE};
use crate::error_handling::ProviderError;
use crate::gateway::ProviderGateway;
use crate::providers::{bool_coerce, number_or_zero};

/// Blacklist listing summary for one IP.
#[derive(Debug, Clone, Default)]
pub struct BlacklistReport {
    /// Number of blacklists listing the IP.
    pub listed_count: u32,
    /// Zone names of the listing blacklists.
    pub listed_zones: Vec<String>,
}

impl BlacklistReport {
    /// Parses a blacklist response body.
    ///
    /// The listed count prefers the provider's own `listedCount`; when that
    /// is absent, the listed entries in `results` are counted instead.
    pub fn from_body(body: &str) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("blacklist response: {e}")))?;

        let listed_zones: Vec<String> = value
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter(|entry| bool_coerce(entry.get("listed")))
                    .filter_map(|entry| entry.get("zone").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let listed_count = match value.get("listedCount") {
            Some(v) => number_or_zero(Some(v)),
            None => listed_zones.len() as u32,
        };

        Ok(Self {
            listed_count,
            listed_zones,
        })
    }

    /// Abuse-score estimate derived from the listing count alone.
    pub fn estimated_abuse_score(&self) -> u8 {
        (self.listed_count * DNSBL_ZONE_WEIGHT).min(MAX_ABUSE_SCORE) as u8
    }
}

/// Checks an IP against the DNS-blacklist provider.
pub async fn check(
    gateway: &ProviderGateway,
    base: &str,
    ip: &str,
) -> Result<BlacklistReport, ProviderError> {
    let url = format!("{base}/dnsbl/check?ip={ip}");
    debug!("blacklist check: {url}");
    let response = gateway.get_ok(&url, &[]).await?;
    BlacklistReport::from_body(&response.body)
}
