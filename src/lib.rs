//! domain_intel library: multi-source domain threat-intelligence aggregation
//!
//! This library answers "is this domain risky?" by aggregating WHOIS,
//! reputation, IP-fraud, abuse-report and DNS-blacklist providers plus page
//! metadata into three result records per scan. Fallback chains keep a scan
//! useful when individual sources fail: an ordered mirror list for page
//! retrieval and a quota-aware API key rotation gateway for the IP-fraud
//! provider.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use domain_intel::{
//!     analyze_domain, AnalysisContext, AnalysisOptions, Credentials,
//!     ProviderEndpoints,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = domain_intel::initialization::init_client(Duration::from_secs(8))?;
//! let context = AnalysisContext::new(
//!     client,
//!     ProviderEndpoints::from_env(),
//!     Credentials::from_env(),
//!     AnalysisOptions::default(),
//! );
//!
//! let outcome = analyze_domain(&context, "example.com").await?;
//! if let Ok((scan, reputation)) = &outcome.records {
//!     println!("{}: risk {}", scan.domain, reputation.risk_level);
//! }
//! let metadata = outcome.metadata.await_result().await;
//! println!("metadata completeness: {}%", metadata.completeness_score);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod config;
mod error_handling;
pub mod gateway;
pub mod initialization;
mod intel;
mod metadata;
mod models;
mod providers;
mod proxy_server;
mod scan;

// Re-export public API
pub use config::{
    AnalysisOptions, Config, Credentials, LogFormat, LogLevel, ProviderEndpoints,
};
pub use error_handling::ProviderError;
pub use metadata::{extract, fetch_metadata};
pub use models::{
    IpIntelligenceRecord, MetadataResult, ReputationResult, RiskLevel, ScanResult,
};
pub use proxy_server::{router as proxy_router, run_proxy_server};
pub use scan::{
    analyze_domain, compute_age, is_ip_literal, parse_date_string, AnalysisContext,
    MetadataHandle, ScanOutcome,
};
