//! Application-wide constants.
//!
//! This module centralizes timeouts, provider defaults, and scoring
//! parameters used across the codebase.

use std::time::Duration;

/// Default per-request timeout for provider calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Per-mirror attempt timeout for metadata retrieval, in seconds.
pub const METADATA_ATTEMPT_TIMEOUT_SECS: u64 = 3;

/// Maximum time a request will wait for the startup key-health check before
/// proceeding with the default pointer.
pub const STARTUP_PROBE_WAIT: Duration = Duration::from_secs(2);

/// Fixed low-cost target used to probe API key health at startup.
pub const KEY_PROBE_IP: &str = "8.8.8.8";

/// Substring that identifies a quota-exceeded response body from the
/// IP-fraud provider. Matched case-insensitively.
pub const DEFAULT_QUOTA_SIGNAL: &str = "exceeded your request quota";

/// Abuse-score points contributed by each DNS blacklist listing when
/// estimating a score from blacklist counts.
pub const DNSBL_ZONE_WEIGHT: u32 = 25;

/// Ceiling for abuse and fraud scores.
pub const MAX_ABUSE_SCORE: u32 = 100;

/// Fixed denominator for the metadata completeness score.
pub const METADATA_FIELD_TOTAL: u32 = 30;

/// Lookback window for abuse reports, in days.
pub const ABUSE_MAX_AGE_DAYS: u32 = 90;

/// Placeholder for fields with no data.
pub const PLACEHOLDER: &str = "-";

/// Days per year used by the domain-age calculation.
pub const AGE_DAYS_PER_YEAR: i64 = 365;

/// Days per month used by the domain-age calculation.
pub const AGE_DAYS_PER_MONTH: i64 = 30;

/// Default WHOIS lookup service base URL.
pub const DEFAULT_WHOIS_BASE: &str = "https://whois-aoi.onrender.com";

/// Default base URL for the reputation, IP-fraud and abuse providers.
///
/// Matches the local API gateway arrangement this tool is normally deployed
/// behind; override per provider via `ProviderEndpoints` or environment.
pub const DEFAULT_GATEWAY_BASE: &str = "http://127.0.0.1:8080/api";

/// Default base URL for the DNS-blacklist checker.
pub const DEFAULT_DNSBL_BASE: &str = "http://127.0.0.1:3001/api";

/// Default mirror templates for metadata page retrieval. `{target}` is
/// replaced with the percent-encoded target URL.
pub const DEFAULT_METADATA_MIRRORS: &[&str] = &[
    "https://api.allorigins.win/raw?url={target}",
    "https://corsproxy.io/?{target}",
    "https://api.codetabs.com/v1/proxy?quest={target}",
];
