//! Result records emitted by a domain scan.
//!
//! Three records are produced per scan: a [`ScanResult`] with WHOIS and
//! IP-level data, a [`ReputationResult`] derived from the reputation
//! provider's attribute bag, and a [`MetadataResult`] that arrives
//! asynchronously. All records are immutable once emitted and identified by
//! a monotonically increasing creation-time id.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::Serialize;

use crate::config::PLACEHOLDER;

static LAST_SCAN_ID: AtomicI64 = AtomicI64::new(0);

/// Returns the next scan record id.
///
/// Ids are wall-clock milliseconds bumped to `max(now, last + 1)`, so they
/// stay strictly increasing even when two records are created within the
/// same millisecond.
pub(crate) fn next_scan_id() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_SCAN_ID.load(Ordering::SeqCst);
    loop {
        let next = std::cmp::max(now, last + 1);
        match LAST_SCAN_ID.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// Current time rendered in the fixed record timestamp format.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Renders an epoch-seconds value in the record timestamp format.
pub(crate) fn render_epoch(secs: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Risk classification derived from the reputation provider's analysis
/// counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    /// No malicious or suspicious verdicts.
    Clean,
    /// At least one suspicious verdict.
    Low,
    /// At least one malicious verdict, or more than three suspicious.
    Medium,
    /// More than five malicious verdicts.
    High,
}

impl RiskLevel {
    /// Derives the risk level from malicious/suspicious verdict counts.
    ///
    /// Thresholds are strict and evaluated in order; the first match wins.
    pub fn from_counts(malicious: u32, suspicious: u32) -> Self {
        if malicious > 5 {
            RiskLevel::High
        } else if malicious > 0 || suspicious > 3 {
            RiskLevel::Medium
        } else if suspicious > 0 {
            RiskLevel::Low
        } else {
            RiskLevel::Clean
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Clean => "Clean",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed domain scan.
///
/// WHOIS dates and registrar are seeded from the reputation provider and
/// overridden by WHOIS when it succeeds; location and ISP fields come from
/// IP intelligence and keep their `-` placeholder when the resolved address
/// is not an IP literal.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Monotonically increasing creation-time id.
    pub id: i64,
    /// The scanned domain.
    pub domain: String,
    /// Registration date, rendered, or `-`.
    pub created: String,
    /// Expiry date, rendered, or `-`.
    pub expires: String,
    /// Registrar name, or `-`.
    pub registrar: String,
    /// Name-server hostnames from the reputation provider's DNS records.
    pub name_servers: Vec<String>,
    /// All DNS records flattened to `TYPE: value; ...`, or `-`.
    pub dns_records: String,
    /// Maximum abuse score seen across contributing providers (0-100).
    pub abuse_score: u8,
    /// True if VPN, proxy or Tor use was detected for the resolved IP.
    pub is_anonymized: bool,
    /// Resolved IP address, or `-`.
    pub ip_address: String,
    /// Country code, or `-`.
    pub country: String,
    /// Region name, or `-`.
    pub region: String,
    /// City name, or `-`.
    pub city: String,
    /// Latitude, or `-`.
    pub latitude: String,
    /// Longitude, or `-`.
    pub longitude: String,
    /// ISP or organization name, or `-`.
    pub isp: String,
    /// Capture time, rendered.
    pub timestamp: String,
}

impl ScanResult {
    /// Human-readable domain age, derived from the creation date at read
    /// time. `-` when no creation date is known; unparseable dates pass
    /// through unchanged.
    pub fn domain_age(&self) -> String {
        if self.created == PLACEHOLDER {
            return PLACEHOLDER.to_string();
        }
        crate::scan::compute_age(&self.created)
    }
}

/// Reputation provider verdict summary for one scan.
///
/// Vote, category and rank fields are passed through opaquely; the risk
/// level is derived from the analysis counters.
#[derive(Debug, Clone, Serialize)]
pub struct ReputationResult {
    /// Monotonically increasing creation-time id.
    pub id: i64,
    /// The scanned domain.
    pub domain: String,
    /// Capture time, rendered.
    pub timestamp: String,
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
    pub total_votes: serde_json::Value,
    /// Categorization by engine, opaque.
    pub categories: serde_json::Value,
    /// Popularity ranks by source, opaque.
    pub popularity_ranks: serde_json::Value,
    /// Per-engine verdicts, opaque.
    pub last_analysis_results: serde_json::Value,
    /// Provider tags.
    pub tags: Vec<String>,
    /// Registrar as reported by the reputation provider.
    pub registrar: Option<String>,
    /// Registration date, rendered.
    pub creation_date: Option<String>,
    /// Whether the provider has a recent HTTPS certificate on file.
    pub has_https_certificate: bool,
    /// Risk level derived from the analysis counters.
    pub risk_level: RiskLevel,
}

/// Page metadata extracted from the scanned domain's markup.
///
/// Produced asynchronously and may arrive after the other two records. On
/// total extraction failure only `id`, `domain`, `timestamp` and `error`
/// are populated.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResult {
    /// Monotonically increasing creation-time id.
    pub id: i64,
    /// The scanned domain.
    pub domain: String,
    /// Capture time, rendered.
    pub timestamp: String,
    /// Page title (social-card title preferred).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Page description (social-card description preferred).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Meta keywords.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Document language or locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Publisher / site name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Open Graph content type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Primary image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Primary image alt text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    /// Canonical or social URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Twitter card type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,
    /// Twitter site handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_site: Option<String>,
    /// Twitter creator handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_creator: Option<String>,
    /// Publish date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Last-modified date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
    /// Article section / category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Article tags, comma-joined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Favicon URL, absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    /// Touch-icon URL, absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Robots directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots: Option<String>,
    /// Viewport directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    /// Theme color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    /// Character set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// RSS feed URL, absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_feed: Option<String>,
    /// Atom feed URL, absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_feed: Option<String>,
    /// Schema.org type of the first structured-data block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Parsed structured-data blocks, raw.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub json_ld: Vec<serde_json::Value>,
    /// Percentage of the fixed field checklist that was populated.
    pub completeness_score: u8,
    /// Set when extraction failed entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetadataResult {
    /// Creates an empty record with bookkeeping fields populated.
    pub(crate) fn new(domain: &str) -> Self {
        MetadataResult {
            id: next_scan_id(),
            domain: domain.to_string(),
            timestamp: now_timestamp(),
            ..Default::default()
        }
    }

    /// Creates the failure-path record: bookkeeping fields plus an error.
    pub(crate) fn failed(domain: &str, error: String) -> Self {
        MetadataResult {
            error: Some(error),
            ..MetadataResult::new(domain)
        }
    }
}

/// IP intelligence merged from the fraud, abuse and blacklist providers.
///
/// Cached per IP for the process lifetime; once cached, never re-fetched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IpIntelligenceRecord {
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
    /// Maximum abuse score across contributing providers (0-100).
    pub abuse_score: u8,
    /// Abuse-report provider confidence score, raw.
    pub abuse_confidence_score: u8,
    /// Number of abuse reports on file.
    pub total_reports: u32,
    /// Most recent abuse report time, raw.
    pub last_reported_at: Option<String>,
    /// Number of DNS blacklists listing this IP.
    pub listed_count: u32,
    /// Zone names of the blacklists listing this IP.
    pub listed_zones: Vec<String>,
}

impl IpIntelligenceRecord {
    /// True if any anonymizing network was detected.
    pub fn is_anonymized(&self) -> bool {
        self.vpn || self.proxy || self.tor
    }

    /// Raises the merged abuse score; never lowers it.
    pub(crate) fn raise_abuse_score(&mut self, candidate: u8) {
        self.abuse_score = self.abuse_score.max(candidate);
    }
}
