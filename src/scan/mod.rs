//! The domain analysis orchestrator.
//!
//! [`analyze_domain`] drives one scan end to end: spawn the metadata
//! side-fetch, query the reputation provider, override WHOIS fields where
//! WHOIS answers, resolve IP-level intelligence when the domain's primary
//! address is an IP literal, and assemble the two synchronous result
//! records. Provider failures are logged and degrade the records; they do
//! not abort the scan.

mod age;

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use log::{info, warn};
use regex::Regex;
use tokio::task::JoinHandle;

use crate::config::{
    AnalysisOptions, Credentials, ProviderEndpoints, DEFAULT_QUOTA_SIGNAL, PLACEHOLDER,
};
use crate::error_handling::ProviderError;
use crate::gateway::key_rotation::KeyRotationGateway;
use crate::gateway::{MirrorFetcher, ProviderGateway};
use crate::intel::IpIntelligenceResolver;
use crate::metadata;
use crate::models::{
    next_scan_id, now_timestamp, render_epoch, MetadataResult, ReputationResult, RiskLevel,
    ScanResult,
};
use crate::providers::{reputation, whois};

pub use age::{compute_age, parse_date_string};

static IPV4_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});
static IPV6_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-fA-F0-9:]+$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

/// Whether the resolved address is an IPv4 or IPv6 literal.
///
/// IP-level providers are only queried for literals; a hostname in an
/// address record is skipped rather than resolved further.
pub fn is_ip_literal(address: &str) -> bool {
    IPV4_LITERAL.is_match(address) || (address.contains(':') && IPV6_LITERAL.is_match(address))
}

/// Shared per-session state driving domain scans.
///
/// Owns the provider gateways and the memoizing IP resolver; one context is
/// built per session and reused across scans so key rotation and the IP
/// cache span the whole run. Callers issue one scan at a time.
pub struct AnalysisContext {
    gateway: ProviderGateway,
    endpoints: ProviderEndpoints,
    resolver: IpIntelligenceResolver,
    mirror_fetcher: MirrorFetcher,
}

impl AnalysisContext {
    /// Builds a context from a shared client, endpoints, credentials and
    /// tunables.
    pub fn new(
        client: Arc<reqwest::Client>,
        endpoints: ProviderEndpoints,
        credentials: Credentials,
        options: AnalysisOptions,
    ) -> Self {
        let gateway = ProviderGateway::new(client, options.request_timeout);
        let fraud_gateway = Arc::new(KeyRotationGateway::new(
            gateway.clone(),
            endpoints.fraud_base.clone(),
            credentials.ipqs_keys,
            DEFAULT_QUOTA_SIGNAL,
        ));
        let resolver = IpIntelligenceResolver::new(
            gateway.clone(),
            fraud_gateway,
            endpoints.abuse_base.clone(),
            endpoints.dnsbl_base.clone(),
            credentials.abuseipdb_key,
        );
        let mirror_fetcher = MirrorFetcher::new(
            gateway.clone(),
            options.metadata_mirrors,
            options.metadata_attempt_timeout,
        );
        Self {
            gateway,
            endpoints,
            resolver,
            mirror_fetcher,
        }
    }
}

/// Handle to the detached metadata side-fetch.
///
/// The fetch races independently of the synchronous records; awaiting the
/// handle is how callers (and tests) observe it deterministically.
pub struct MetadataHandle {
    domain: String,
    handle: JoinHandle<MetadataResult>,
}

impl MetadataHandle {
    /// Waits for the metadata fetch to settle.
    ///
    /// A panicked or cancelled task yields the failure-path record instead
    /// of propagating the join error.
    pub async fn await_result(self) -> MetadataResult {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => MetadataResult::failed(
                &self.domain,
                format!("Failed to fetch metadata: {e}"),
            ),
        }
    }
}

/// Everything one scan produced.
pub struct ScanOutcome {
    /// The detached metadata fetch.
    pub metadata: MetadataHandle,
    /// The two synchronous result records.
    pub records: Result<(ScanResult, ReputationResult)>,
}

/// Runs one full scan of `domain`.
///
/// The metadata side-fetch is spawned before any provider call so it runs
/// even when the synchronous path degrades. Only an empty domain is a hard
/// error; provider failures surface as placeholder fields in the records.
pub async fn analyze_domain(
    context: &AnalysisContext,
    domain: &str,
) -> Result<ScanOutcome, ProviderError> {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        return Err(ProviderError::InputValidation("domain".to_string()));
    }

    let metadata = spawn_metadata_fetch(context, &domain);
    let records = build_records(context, &domain).await;
    Ok(ScanOutcome { metadata, records })
}

fn spawn_metadata_fetch(context: &AnalysisContext, domain: &str) -> MetadataHandle {
    let fetcher = context.mirror_fetcher.clone();
    let domain_owned = domain.to_string();
    let handle = tokio::spawn(async move { metadata::fetch_metadata(fetcher, &domain_owned).await });
    MetadataHandle {
        domain: domain.to_string(),
        handle,
    }
}

async fn build_records(
    context: &AnalysisContext,
    domain: &str,
) -> Result<(ScanResult, ReputationResult)> {
    let attrs = match reputation::lookup(
        &context.gateway,
        &context.endpoints.reputation_base,
        domain,
    )
    .await
    {
        Ok(attrs) => attrs,
        Err(e) => {
            warn!("reputation lookup failed for {domain} ({}): {e}", e.category());
            reputation::ReputationAttributes::empty()
        }
    };

    let reputation_record = ReputationResult {
        id: next_scan_id(),
        domain: domain.to_string(),
        timestamp: now_timestamp(),
        reputation: attrs.reputation,
        malicious: attrs.malicious,
        suspicious: attrs.suspicious,
        harmless: attrs.harmless,
        undetected: attrs.undetected,
        total_votes: attrs.total_votes.clone(),
        categories: attrs.categories.clone(),
        popularity_ranks: attrs.popularity_ranks.clone(),
        last_analysis_results: attrs.last_analysis_results.clone(),
        tags: attrs.tags.clone(),
        registrar: attrs.registrar.clone(),
        creation_date: attrs.creation_date.and_then(render_epoch),
        has_https_certificate: attrs.has_https_certificate,
        risk_level: RiskLevel::from_counts(attrs.malicious, attrs.suspicious),
    };

    // Seed the WHOIS-adjacent fields from reputation, then let WHOIS
    // override whatever it actually answered.
    let mut created = attrs
        .creation_date
        .and_then(render_epoch)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let mut expires = attrs
        .last_modification_date
        .and_then(render_epoch)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let mut registrar = attrs
        .registrar
        .clone()
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    match whois::lookup(&context.gateway, &context.endpoints.whois_base, domain).await {
        Ok(record) => {
            if let Some(value) = record.created {
                created = value;
            }
            if let Some(value) = record.expires {
                expires = value;
            }
            if let Some(value) = record.registrar {
                registrar = value;
            }
        }
        Err(e) => warn!("whois lookup failed for {domain} ({}): {e}", e.category()),
    }

    let mut scan_record = ScanResult {
        id: next_scan_id(),
        domain: domain.to_string(),
        created,
        expires,
        registrar,
        name_servers: attrs.ns_records(),
        dns_records: attrs.dns_records_string(),
        abuse_score: 0,
        is_anonymized: false,
        ip_address: PLACEHOLDER.to_string(),
        country: PLACEHOLDER.to_string(),
        region: PLACEHOLDER.to_string(),
        city: PLACEHOLDER.to_string(),
        latitude: PLACEHOLDER.to_string(),
        longitude: PLACEHOLDER.to_string(),
        isp: PLACEHOLDER.to_string(),
        timestamp: now_timestamp(),
    };

    if let Some(ip) = attrs.primary_ip() {
        if is_ip_literal(&ip) {
            let intel = context.resolver.resolve(&ip).await;
            scan_record.ip_address = ip;
            scan_record.abuse_score = intel.abuse_score;
            scan_record.is_anonymized = intel.is_anonymized();
            let field = |v: Option<String>| v.unwrap_or_else(|| PLACEHOLDER.to_string());
            scan_record.country = field(intel.country);
            scan_record.region = field(intel.region);
            scan_record.city = field(intel.city);
            scan_record.latitude = field(intel.latitude);
            scan_record.longitude = field(intel.longitude);
            scan_record.isp = field(intel.isp);
        } else {
            info!("primary address for {domain} is not an IP literal, skipping IP intelligence");
        }
    }

    Ok((scan_record, reputation_record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_literal() {
        assert!(is_ip_literal("93.184.216.34"));
        assert!(is_ip_literal("8.8.8.8"));
        assert!(!is_ip_literal("example.com"));
        assert!(!is_ip_literal("93.184.216"));
    }

    #[test]
    fn test_ipv6_literal() {
        assert!(is_ip_literal("2606:2800:220:1::1"));
        assert!(is_ip_literal("::1"));
        assert!(!is_ip_literal("deadbeef"));
        assert!(!is_ip_literal("ns1.example.net"));
    }
}
