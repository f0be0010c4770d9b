//! Per-IP intelligence aggregation with session-scoped memoization.
//!
//! [`IpIntelligenceResolver`] merges the fraud, abuse and blacklist
//! providers into one record per IP. An IP is fetched at most once per
//! resolver lifetime; concurrent resolves of the same IP serialize on the
//! cache and the second caller gets the cached record.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use tokio::sync::Mutex;

use crate::gateway::key_rotation::KeyRotationGateway;
use crate::gateway::ProviderGateway;
use crate::models::IpIntelligenceRecord;
use crate::providers::{abuse, dnsbl, ip_fraud};

/// Memoized merger of the three IP-level providers.
pub struct IpIntelligenceResolver {
    gateway: ProviderGateway,
    fraud_gateway: Arc<KeyRotationGateway>,
    abuse_base: String,
    dnsbl_base: String,
    abuse_key: Option<String>,
    cache: Mutex<HashMap<String, IpIntelligenceRecord>>,
}

impl IpIntelligenceResolver {
    /// Creates a resolver over the given gateways and provider bases.
    pub fn new(
        gateway: ProviderGateway,
        fraud_gateway: Arc<KeyRotationGateway>,
        abuse_base: impl Into<String>,
        dnsbl_base: impl Into<String>,
        abuse_key: Option<String>,
    ) -> Self {
        Self {
            gateway,
            fraud_gateway,
            abuse_base: abuse_base.into(),
            dnsbl_base: dnsbl_base.into(),
            abuse_key,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves intelligence for an IP, fetching at most once per IP.
    ///
    /// Never fails: each provider's failure is logged and the record keeps
    /// its defaults for that provider's fields. The cache lock is held
    /// across the fetch so a concurrent resolve of the same IP waits for
    /// the first rather than fetching again.
    pub async fn resolve(&self, ip: &str) -> IpIntelligenceRecord {
        let mut cache = self.cache.lock().await;
        if let Some(record) = cache.get(ip) {
            return record.clone();
        }
        let record = self.fetch(ip).await;
        cache.insert(ip.to_string(), record.clone());
        record
    }

    /// Fetches and merges all three providers for one IP.
    ///
    /// Order matters: fraud seeds the score and location; abuse raises the
    /// score; the blacklist estimate applies only when the abuse call failed
    /// and the score is still zero.
    async fn fetch(&self, ip: &str) -> IpIntelligenceRecord {
        let mut record = IpIntelligenceRecord::default();

        match ip_fraud::check(&self.fraud_gateway, ip).await {
            Ok(fraud) => {
                record.fraud_score = fraud.fraud_score;
                record.vpn = fraud.vpn;
                record.proxy = fraud.proxy;
                record.tor = fraud.tor;
                record.country = fraud.country;
                record.region = fraud.region;
                record.city = fraud.city;
                record.latitude = fraud.latitude;
                record.longitude = fraud.longitude;
                record.isp = fraud.isp;
                record.raise_abuse_score(fraud.fraud_score);
            }
            Err(e) => warn!("fraud check failed for {ip} ({}): {e}", e.category()),
        }

        let abuse_failed = match abuse::check(
            &self.gateway,
            &self.abuse_base,
            self.abuse_key.as_deref(),
            ip,
        )
        .await
        {
            Ok(report) => {
                record.abuse_confidence_score = report.confidence_score;
                record.total_reports = report.total_reports;
                record.last_reported_at = report.last_reported_at;
                record.raise_abuse_score(report.confidence_score);
                false
            }
            Err(e) => {
                warn!("abuse check failed for {ip} ({}): {e}", e.category());
                true
            }
        };

        match dnsbl::check(&self.gateway, &self.dnsbl_base, ip).await {
            Ok(report) => {
                if abuse_failed && record.abuse_score == 0 {
                    record.raise_abuse_score(report.estimated_abuse_score());
                }
                record.listed_count = report.listed_count;
                record.listed_zones = report.listed_zones;
            }
            Err(e) => warn!("blacklist check failed for {ip} ({}): {e}", e.category()),
        }

        record
    }
}
