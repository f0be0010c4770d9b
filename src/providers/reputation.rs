//! Domain reputation provider.
//!
//! The provider answers with a large attribute bag under `data.attributes`.
//! Verdict counters, DNS records and WHOIS-adjacent fields are pulled out
//! typed; community votes, categories, popularity ranks and per-engine
//! verdicts are carried opaquely for pass-through display.

use log::debug;
use serde_json::Value;

use crate::config::PLACEHOLDER;
use crate::error_handling::ProviderError;
use crate::gateway::ProviderGateway;
use crate::providers::{first_string, number_or_zero};

/// Typed view of the reputation provider's attribute bag.
#[derive(Debug, Clone, Default)]
pub struct ReputationAttributes {
    /// Community reputation score.
    pub reputation: i64,
    /// Engines reporting the domain malicious.
    pub malicious: u32,
    /// Engines reporting the domain suspicious.
    pub suspicious: u32,
    /// Engines reporting the domain harmless.
    pub harmless: u32,
    /// Engines with no verdict.
    pub undetected: u32,
    /// Community vote totals, opaque.
    pub total_votes: Value,
    /// Categorization by engine, opaque.
    pub categories: Value,
    /// Popularity ranks by source, opaque.
    pub popularity_ranks: Value,
    /// Per-engine verdicts, opaque.
    pub last_analysis_results: Value,
    /// Provider tags.
    pub tags: Vec<String>,
    /// Registrar name, when reported.
    pub registrar: Option<String>,
    /// Registration date as epoch seconds, when reported.
    pub creation_date: Option<i64>,
    /// Last record modification as epoch seconds, when reported. Seeds the
    /// expiry field until WHOIS answers with the real one.
    pub last_modification_date: Option<i64>,
    /// Whether a recent HTTPS certificate is on file.
    pub has_https_certificate: bool,
    /// DNS records as `(type, value)` pairs.
    pub dns_records: Vec<(String, String)>,
}

impl ReputationAttributes {
    /// The all-defaults record used when the provider call fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a reputation response body, reading `data.attributes`.
    pub fn from_body(body: &str) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("reputation response: {e}")))?;
        let attrs = value
            .get("data")
            .and_then(|d| d.get("attributes"))
            .ok_or_else(|| {
                ProviderError::Parse("reputation response missing data.attributes".to_string())
            })?;

        let stats = attrs.get("last_analysis_stats");
        let stat = |name: &str| number_or_zero(stats.and_then(|s| s.get(name)));

        let tags = attrs
            .get("tags")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let dns_records = attrs
            .get("last_dns_records")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| {
                        let record_type = r.get("type").and_then(Value::as_str)?;
                        let record_value = r.get("value").and_then(Value::as_str)?;
                        Some((record_type.to_string(), record_value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            reputation: attrs
                .get("reputation")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            malicious: stat("malicious"),
            suspicious: stat("suspicious"),
            harmless: stat("harmless"),
            undetected: stat("undetected"),
            total_votes: attrs.get("total_votes").cloned().unwrap_or(Value::Null),
            categories: attrs.get("categories").cloned().unwrap_or(Value::Null),
            popularity_ranks: attrs
                .get("popularity_ranks")
                .cloned()
                .unwrap_or(Value::Null),
            last_analysis_results: attrs
                .get("last_analysis_results")
                .cloned()
                .unwrap_or(Value::Null),
            tags,
            registrar: first_string(attrs, &["registrar"]),
            creation_date: attrs.get("creation_date").and_then(Value::as_i64),
            last_modification_date: attrs
                .get("last_modification_date")
                .and_then(Value::as_i64),
            has_https_certificate: attrs.get("last_https_certificate").is_some(),
            dns_records,
        })
    }

    /// Name-server hostnames from the DNS records.
    pub fn ns_records(&self) -> Vec<String> {
        self.dns_records
            .iter()
            .filter(|(t, _)| t == "NS")
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// First A-record address, falling back to the first AAAA record.
    pub fn primary_ip(&self) -> Option<String> {
        let by_type = |wanted: &str| {
            self.dns_records
                .iter()
                .find(|(t, _)| t == wanted)
                .map(|(_, v)| v.clone())
        };
        by_type("A").or_else(|| by_type("AAAA"))
    }

    /// All DNS records flattened to `TYPE: value; ...`, or the placeholder
    /// when there are none.
    pub fn dns_records_string(&self) -> String {
        if self.dns_records.is_empty() {
            return PLACEHOLDER.to_string();
        }
        self.dns_records
            .iter()
            .map(|(t, v)| format!("{t}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Fetches the reputation attributes for a domain.
pub async fn lookup(
    gateway: &ProviderGateway,
    base: &str,
    domain: &str,
) -> Result<ReputationAttributes, ProviderError> {
    let url = format!("{base}/reputation/domains/{domain}");
    debug!("reputation lookup: {url}");
    let response = gateway.get_ok(&url, &[]).await?;
    ReputationAttributes::from_body(&response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> &'static str {
        r#"{
            "data": {
                "attributes": {
                    "reputation": 120,
                    "last_analysis_stats": {
                        "malicious": 0, "suspicious": 0,
                        "harmless": 70, "undetected": 20
                    },
                    "last_dns_records": [
                        {"type": "NS", "value": "a.iana-servers.net"},
                        {"type": "NS", "value": "b.iana-servers.net"},
                        {"type": "A", "value": "93.184.216.34"},
                        {"type": "AAAA", "value": "2606:2800:220:1::1"}
                    ],
                    "creation_date": 808371213,
                    "last_modification_date": 1755028800,
                    "registrar": "RESERVED-IANA",
                    "tags": ["benign"],
                    "total_votes": {"harmless": 30, "malicious": 1},
                    "last_https_certificate": {"size": 1234}
                }
            }
        }"#
    }

    #[test]
    fn test_parses_counters_and_records() {
        let attrs = ReputationAttributes::from_body(sample_body()).unwrap();
        assert_eq!(attrs.reputation, 120);
        assert_eq!(attrs.malicious, 0);
        assert_eq!(attrs.harmless, 70);
        assert_eq!(attrs.undetected, 20);
        assert_eq!(attrs.ns_records().len(), 2);
        assert_eq!(attrs.primary_ip().as_deref(), Some("93.184.216.34"));
        assert_eq!(attrs.creation_date, Some(808371213));
        assert_eq!(attrs.last_modification_date, Some(1755028800));
        assert_eq!(attrs.registrar.as_deref(), Some("RESERVED-IANA"));
        assert!(attrs.has_https_certificate);
        assert_eq!(attrs.tags, vec!["benign".to_string()]);
    }

    #[test]
    fn test_primary_ip_falls_back_to_aaaa() {
        let attrs = ReputationAttributes {
            dns_records: vec![
                ("NS".to_string(), "ns1.example.net".to_string()),
                ("AAAA".to_string(), "2606:2800:220:1::1".to_string()),
            ],
            ..Default::default()
        };
        assert_eq!(attrs.primary_ip().as_deref(), Some("2606:2800:220:1::1"));
    }

    #[test]
    fn test_dns_records_string_format() {
        let attrs = ReputationAttributes::from_body(sample_body()).unwrap();
        let flattened = attrs.dns_records_string();
        assert!(flattened.starts_with("NS: a.iana-servers.net; "));
        assert!(flattened.ends_with("AAAA: 2606:2800:220:1::1"));
    }

    #[test]
    fn test_dns_records_string_placeholder_when_empty() {
        assert_eq!(ReputationAttributes::empty().dns_records_string(), "-");
    }

    #[test]
    fn test_missing_attributes_is_parse_error() {
        let err = ReputationAttributes::from_body(r#"{"data":{}}"#).unwrap_err();
        assert_eq!(err.category(), "parse");
    }

    #[test]
    fn test_empty_has_no_certificate() {
        assert!(!ReputationAttributes::empty().has_https_certificate);
    }
}
