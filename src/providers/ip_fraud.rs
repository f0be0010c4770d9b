//! IP-fraud provider, reached through the key-rotation gateway.
//!
//! The provider is loose with types: scores arrive as numbers or numeric
//! strings, anonymization flags as booleans, numbers or words, and location
//! fields under several aliases. Coercion happens here once.

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::config::MAX_ABUSE_SCORE;
use crate::error_handling::ProviderError;
use crate::gateway::key_rotation::KeyRotationGateway;
use crate::providers::{bool_coerce, first_string, number_or_zero};

/// Typed fraud report for one IP.
#[derive(Debug, Clone, Default)]
pub struct FraudReport {
    /// Provider-assigned fraud likelihood (0-100).
    pub fraud_score: u8,
    /// VPN detected.
    pub vpn: bool,
    /// Proxy detected.
    pub proxy: bool,
    /// Tor exit detected.
    pub tor: bool,
    /// Country code, when reported.
    pub country: Option<String>,
    /// Region, when reported.
    pub region: Option<String>,
    /// City, when reported.
    pub city: Option<String>,
    /// Latitude, when reported.
    pub latitude: Option<String>,
    /// Longitude, when reported.
    pub longitude: Option<String>,
    /// ISP or organization, when reported.
    pub isp: Option<String>,
}

impl FraudReport {
    /// Parses a fraud response body with tolerant coercion.
    ///
    /// A body whose `success` field is explicitly false (invalid key, quota
    /// exhausted) is a parse-level failure carrying the provider's message.
    pub fn from_body(body: &str) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("fraud response: {e}")))?;

        if value.get("success") == Some(&Value::Bool(false)) {
            let message = first_string(&value, &["message"])
                .unwrap_or_else(|| "provider reported failure".to_string());
            return Err(ProviderError::Parse(message));
        }

        Ok(Self {
            fraud_score: number_or_zero(value.get("fraud_score")).min(MAX_ABUSE_SCORE) as u8,
            vpn: bool_coerce(value.get("vpn")),
            proxy: bool_coerce(value.get("proxy")),
            tor: bool_coerce(value.get("tor")),
            country: first_string(&value, &["country_code", "country"]),
            region: first_string(&value, &["region"]),
            city: first_string(&value, &["city"]),
            latitude: first_string(&value, &["latitude"]),
            longitude: first_string(&value, &["longitude"]),
            isp: first_string(&value, &["ISP", "isp", "organization"]),
        })
    }
}

/// Checks an IP against the fraud provider through the rotation gateway.
pub async fn check(
    gateway: &Arc<KeyRotationGateway>,
    ip: &str,
) -> Result<FraudReport, ProviderError> {
    debug!("fraud check for {ip}");
    let response = gateway.check_ip(ip).await?;
    if !response.is_success() {
        return Err(ProviderError::Upstream {
            status: response.status,
            body: response.body,
        });
    }
    FraudReport::from_body(&response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_typical_body() {
        let report = FraudReport::from_body(
            r#"{
                "success": true, "fraud_score": 82, "vpn": true, "proxy": false,
                "tor": false, "country_code": "NL", "region": "North Holland",
                "city": "Amsterdam", "latitude": 52.37, "longitude": 4.89,
                "ISP": "Example Hosting BV"
            }"#,
        )
        .unwrap();
        assert_eq!(report.fraud_score, 82);
        assert!(report.vpn);
        assert!(!report.proxy);
        assert_eq!(report.country.as_deref(), Some("NL"));
        assert_eq!(report.latitude.as_deref(), Some("52.37"));
        assert_eq!(report.isp.as_deref(), Some("Example Hosting BV"));
    }

    #[test]
    fn test_coerces_loose_types() {
        let report = FraudReport::from_body(
            r#"{"fraud_score": "17", "vpn": 1, "proxy": "true", "tor": "0", "isp": "X"}"#,
        )
        .unwrap();
        assert_eq!(report.fraud_score, 17);
        assert!(report.vpn);
        assert!(report.proxy);
        assert!(!report.tor);
        assert_eq!(report.isp.as_deref(), Some("X"));
    }

    #[test]
    fn test_missing_score_is_zero() {
        let report = FraudReport::from_body(r#"{"vpn": false}"#).unwrap();
        assert_eq!(report.fraud_score, 0);
    }

    #[test]
    fn test_score_capped_at_hundred() {
        let report = FraudReport::from_body(r#"{"fraud_score": 250}"#).unwrap();
        assert_eq!(report.fraud_score, 100);
    }

    #[test]
    fn test_explicit_failure_body_is_error() {
        let err = FraudReport::from_body(
            r#"{"success": false, "message": "You have exceeded your request quota of 25 per day."}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("request quota"));
    }
}
