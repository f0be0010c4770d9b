//! WHOIS lookup provider.

use log::debug;
use serde_json::Value;

use crate::error_handling::ProviderError;
use crate::gateway::ProviderGateway;
use crate::providers::first_string;

/// The three WHOIS fields consumed by a scan.
#[derive(Debug, Clone, Default)]
pub struct WhoisRecord {
    /// Registration date, as reported.
    pub created: Option<String>,
    /// Expiry date, as reported.
    pub expires: Option<String>,
    /// Registrar name, as reported.
    pub registrar: Option<String>,
}

impl WhoisRecord {
    /// Parses a WHOIS response body, tolerating field-name aliases.
    pub fn from_body(body: &str) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("whois response: {e}")))?;
        Ok(Self {
            created: first_string(&value, &["created", "creation_date"]),
            expires: first_string(&value, &["expires", "expiry_date"]),
            registrar: first_string(&value, &["registrar"]),
        })
    }
}

/// Fetches the WHOIS record for a domain.
pub async fn lookup(
    gateway: &ProviderGateway,
    base: &str,
    domain: &str,
) -> Result<WhoisRecord, ProviderError> {
    let url = format!("{base}/whois?domain={domain}");
    debug!("whois lookup: {url}");
    let response = gateway.get_ok(&url, &[]).await?;
    WhoisRecord::from_body(&response.body)
}
