//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument
//! parsing and library configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_DNSBL_BASE, DEFAULT_GATEWAY_BASE, DEFAULT_METADATA_MIRRORS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WHOIS_BASE, METADATA_ATTEMPT_TIMEOUT_SECS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options and scan configuration.
///
/// Parsed from CLI arguments via `Config::parse()` in the binary; library
/// callers can construct it directly.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "domain_intel",
    about = "Aggregates WHOIS, reputation, IP-fraud, abuse and DNS-blacklist intelligence for domains"
)]
pub struct Config {
    /// Domains to analyze (scanned one at a time)
    pub domains: Vec<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Per-request timeout for provider calls, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Per-mirror attempt timeout for metadata retrieval, in seconds
    #[arg(long, default_value_t = METADATA_ATTEMPT_TIMEOUT_SECS)]
    pub metadata_timeout_seconds: u64,

    /// Emit results as JSON instead of the human-readable report
    #[arg(long)]
    pub json: bool,

    /// Run the credential-injecting provider boundary server on this port
    /// instead of scanning
    #[arg(long)]
    pub proxy_port: Option<u16>,
}

/// Base URLs for the consumed intelligence providers.
///
/// Every provider call is built as `<base><fixed path>`, so tests and
/// alternate deployments can point any provider at a different host.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    /// WHOIS lookup service base (`/whois?domain=<d>`)
    pub whois_base: String,
    /// Reputation provider base (`/reputation/domains/<d>`)
    pub reputation_base: String,
    /// IP-fraud provider base (`/fraud/ip/<key>/<ip>`)
    pub fraud_base: String,
    /// Abuse-report provider base (`/abuse/check?ipAddress=<ip>`)
    pub abuse_base: String,
    /// DNS-blacklist provider base (`/dnsbl/check?ip=<ip>`)
    pub dnsbl_base: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            whois_base: DEFAULT_WHOIS_BASE.to_string(),
            reputation_base: DEFAULT_GATEWAY_BASE.to_string(),
            fraud_base: DEFAULT_GATEWAY_BASE.to_string(),
            abuse_base: DEFAULT_GATEWAY_BASE.to_string(),
            dnsbl_base: DEFAULT_DNSBL_BASE.to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// Builds endpoints from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `WHOIS_BASE_URL`, `REPUTATION_BASE_URL`,
    /// `FRAUD_BASE_URL`, `ABUSE_BASE_URL`, `DNSBL_BASE_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            whois_base: std::env::var("WHOIS_BASE_URL").unwrap_or(defaults.whois_base),
            reputation_base: std::env::var("REPUTATION_BASE_URL")
                .unwrap_or(defaults.reputation_base),
            fraud_base: std::env::var("FRAUD_BASE_URL").unwrap_or(defaults.fraud_base),
            abuse_base: std::env::var("ABUSE_BASE_URL").unwrap_or(defaults.abuse_base),
            dnsbl_base: std::env::var("DNSBL_BASE_URL").unwrap_or(defaults.dnsbl_base),
        }
    }
}

/// Provider credentials, loaded from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// IP-fraud provider API key pool, in priority order.
    pub ipqs_keys: Vec<String>,
    /// Abuse-report provider API key.
    pub abuseipdb_key: Option<String>,
}

impl Credentials {
    /// Loads credentials from the environment.
    ///
    /// `IPQS_API_KEYS` is a comma-separated pool in priority order;
    /// `IPQS_API_KEY` (singular) is accepted as a pool of one.
    /// `ABUSEIPDB_API_KEY` holds the abuse-report provider key.
    pub fn from_env() -> Self {
        let ipqs_keys = std::env::var("IPQS_API_KEYS")
            .or_else(|_| std::env::var("IPQS_API_KEY"))
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let abuseipdb_key = std::env::var("ABUSEIPDB_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            ipqs_keys,
            abuseipdb_key,
        }
    }
}

/// Tunables for a scan that are not provider endpoints or credentials.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Per-request timeout for provider calls.
    pub request_timeout: Duration,
    /// Mirror templates for metadata retrieval (`{target}` placeholder).
    pub metadata_mirrors: Vec<String>,
    /// Per-mirror attempt timeout for metadata retrieval.
    pub metadata_attempt_timeout: Duration,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            metadata_mirrors: DEFAULT_METADATA_MIRRORS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            metadata_attempt_timeout: Duration::from_secs(METADATA_ATTEMPT_TIMEOUT_SECS),
        }
    }
}
